//! Status / progress / checklist projection.
//!
//! Both write paths that touch completion go through [`apply_progress_update`]:
//!
//! - a checklist replacement is authoritative for progress, and status is
//!   derived from it (0% Pending, 100% Completed, anything else In Progress);
//! - an explicit status write is authoritative for status; `Completed` marks
//!   every checklist item done and pins progress at 100, other statuses leave
//!   progress untouched.

use super::model::{ChecklistItem, Task, TaskStatus};

#[derive(Debug, Clone)]
pub enum ProgressUpdate {
    Checklist(Vec<ChecklistItem>),
    Status(TaskStatus),
}

/// `round(100 * completed / total)`, 0 for an empty checklist.
pub fn checklist_progress(items: &[ChecklistItem]) -> u8 {
    let total = items.len();
    if total == 0 {
        return 0;
    }
    let completed = items.iter().filter(|item| item.completed).count();
    // Integer half-up rounding of 100 * completed / total.
    ((completed * 200 + total) / (2 * total)) as u8
}

pub fn status_for_progress(progress: u8) -> TaskStatus {
    match progress {
        0 => TaskStatus::Pending,
        100..=u8::MAX => TaskStatus::Completed,
        _ => TaskStatus::InProgress,
    }
}

pub fn apply_progress_update(task: &mut Task, update: ProgressUpdate) {
    task.stored_status = None;
    match update {
        ProgressUpdate::Checklist(items) => {
            task.todo_checklist = items;
            task.progress = checklist_progress(&task.todo_checklist);
            task.status = status_for_progress(task.progress);
        }
        ProgressUpdate::Status(status) => {
            task.status = status;
            if status == TaskStatus::Completed {
                for item in &mut task.todo_checklist {
                    item.completed = true;
                }
                task.progress = 100;
            }
        }
    }
}
