//! Domain atoms for the task board: users, tasks, projects and media.
//!
//! Atoms own their DynamoDB item mapping and take clients as arguments;
//! composed features live in the blocks.

pub mod access;
pub mod dynamo;
pub mod error;
pub mod http;
pub mod media;
pub mod projects;
pub mod tasks;
pub mod users;

pub use access::Caller;
pub use error::ApiError;
