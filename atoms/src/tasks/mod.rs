pub mod model;
pub mod progress;
pub mod service;

pub use model::{
    normalize_checklist, ChecklistItem, ChecklistPayload, CreateTaskPayload, Priority, StatusPayload, Task,
    TaskDomain, TaskStatus, UpdateTaskPayload,
};
pub use progress::{apply_progress_update, ProgressUpdate};
pub use service::*;
