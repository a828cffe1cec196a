pub mod model;
pub mod service;
pub mod http;

pub use model::{StoredImage, UploadedImage};
pub use service::*;
pub use http::*;
