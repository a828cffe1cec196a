//! Role-scoped task listing.

use taskboard_atoms::tasks::{Task, TaskStatus};
use taskboard_atoms::{ApiError, Caller};

use crate::types::StatusSummary;

/// Tasks the caller may see: everything for admins, own assignments otherwise.
pub fn scope_tasks(tasks: Vec<Task>, caller: &Caller) -> Vec<Task> {
    tasks.into_iter().filter(|t| caller.can_view(t)).collect()
}

/// Parse the `status` query parameter. Empty means no filter.
pub fn parse_status_filter(raw: Option<&str>) -> Result<Option<TaskStatus>, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => TaskStatus::from_loose(s)
            .map(Some)
            .ok_or_else(|| ApiError::bad_request(format!("Invalid status filter: {}", s))),
    }
}

pub fn status_summary(tasks: &[Task]) -> StatusSummary {
    let mut summary = StatusSummary {
        all: tasks.len(),
        ..Default::default()
    };
    for task in tasks {
        match task.status {
            TaskStatus::Pending => summary.pending_tasks += 1,
            TaskStatus::InProgress => summary.in_progress_tasks += 1,
            TaskStatus::Completed => summary.completed_tasks += 1,
        }
    }
    summary
}

/// Split a scoped list into the filtered page and the unfiltered summary.
pub fn filter_with_summary(scoped: Vec<Task>, filter: Option<TaskStatus>) -> (Vec<Task>, StatusSummary) {
    let summary = status_summary(&scoped);
    let tasks = match filter {
        Some(status) => scoped.into_iter().filter(|t| t.status == status).collect(),
        None => scoped,
    };
    (tasks, summary)
}
