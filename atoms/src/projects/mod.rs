pub mod model;
pub mod service;
pub mod http;

pub use model::{CreateProjectPayload, Project};
pub use service::*;
pub use http::*;
