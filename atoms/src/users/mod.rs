pub mod model;
pub mod service;

pub use model::{email_key, NewUser, Role, User, UserSummary};
pub use service::*;
