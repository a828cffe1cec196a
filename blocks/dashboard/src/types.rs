use chrono::{DateTime, Utc};
use serde::Serialize;
use taskboard_atoms::tasks::{ChecklistItem, Priority, Task, TaskDomain, TaskStatus};
use taskboard_atoms::users::{User, UserSummary};

// ========== TASK RESPONSES ==========

/// A task as clients see it: assignees populated with their summaries.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    #[serde(rename = "_id")]
    pub task_id: String,
    pub title: String,
    pub description: Option<String>,
    pub project_name: String,
    pub priority: Priority,
    pub status: TaskStatus,
    pub domain: Option<TaskDomain>,
    pub due_date: DateTime<Utc>,
    pub assigned_to: Vec<UserSummary>,
    pub created_by: String,
    pub attachments: Vec<String>,
    pub todo_checklist: Vec<ChecklistItem>,
    pub progress: u8,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_todo_count: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct TaskMessage {
    pub message: &'static str,
    pub task: TaskView,
}

#[derive(Debug, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatusSummary {
    pub all: usize,
    pub pending_tasks: usize,
    pub in_progress_tasks: usize,
    pub completed_tasks: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskListResponse {
    pub tasks: Vec<TaskView>,
    pub status_summary: StatusSummary,
}

// ========== DASHBOARD ==========

#[derive(Debug, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_tasks: usize,
    pub pending_tasks: usize,
    pub completed_tasks: usize,
    pub overdue_tasks: usize,
    pub in_progress_tasks: usize,
}

/// Every status bucket is always present, zero when empty.
#[derive(Debug, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct StatusDistribution {
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub all: usize,
}

#[derive(Debug, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct PriorityDistribution {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
    pub critical: usize,
}

#[derive(Debug, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Charts {
    pub task_distribution: StatusDistribution,
    pub task_priority_levels: PriorityDistribution,
}

/// Slim task shape for the "recent tasks" table.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecentTask {
    #[serde(rename = "_id")]
    pub task_id: String,
    pub title: String,
    pub description: Option<String>,
    pub project_name: String,
    pub priority: Priority,
    pub status: TaskStatus,
    pub due_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub assigned_to: Vec<String>,
    pub created_by: String,
}

impl From<&Task> for RecentTask {
    fn from(task: &Task) -> Self {
        Self {
            task_id: task.task_id.clone(),
            title: task.title.clone(),
            description: task.description.clone(),
            project_name: task.project_name.clone(),
            priority: task.priority,
            status: task.status,
            due_date: task.due_date,
            created_at: task.created_at,
            assigned_to: task.assigned_to.clone(),
            created_by: task.created_by.clone(),
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub statistics: Statistics,
    pub charts: Charts,
    pub recent_tasks: Vec<RecentTask>,
}

// ========== USERS ==========

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserWithTaskCounts {
    #[serde(flatten)]
    pub user: User,
    pub pending_tasks: usize,
    pub in_progress_tasks: usize,
    pub completed_tasks: usize,
}
