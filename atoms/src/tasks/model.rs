use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::progress::{apply_progress_update, ProgressUpdate};
use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TaskStatus {
    #[default]
    Pending,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [TaskStatus::Pending, TaskStatus::InProgress, TaskStatus::Completed];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Completed => "Completed",
        }
    }

    /// Case-insensitive parse that also accepts the legacy spellings found
    /// in older task records ("todo", "ongoing", "done", ...).
    pub fn from_loose(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "pending" | "todo" | "to-do" => Some(TaskStatus::Pending),
            "in progress" | "inprogress" | "in-progress" | "in_progress" | "ongoing" => {
                Some(TaskStatus::InProgress)
            }
            "completed" | "done" | "finished" => Some(TaskStatus::Completed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Priority {
    pub const ALL: [Priority; 4] = [Priority::Low, Priority::Medium, Priority::High, Priority::Critical];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
            Priority::Critical => "Critical",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskDomain {
    Sales,
    Management,
    Marketing,
    Operations,
    #[serde(rename = "IT & Technical")]
    ItTechnical,
    Testing,
}

impl TaskDomain {
    pub const ALL: [TaskDomain; 6] = [
        TaskDomain::Sales,
        TaskDomain::Management,
        TaskDomain::Marketing,
        TaskDomain::Operations,
        TaskDomain::ItTechnical,
        TaskDomain::Testing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskDomain::Sales => "Sales",
            TaskDomain::Management => "Management",
            TaskDomain::Marketing => "Marketing",
            TaskDomain::Operations => "Operations",
            TaskDomain::ItTechnical => "IT & Technical",
            TaskDomain::Testing => "Testing",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.as_str() == s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItem {
    pub title: String,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub completed: bool,
}

/// Task domain model. `status` and `progress` are only ever changed through
/// [`apply_progress_update`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(rename = "_id")]
    pub task_id: String,
    pub title: String,
    pub description: Option<String>,
    pub project_name: String,
    pub priority: Priority,
    pub status: TaskStatus,
    pub domain: Option<TaskDomain>,
    pub due_date: DateTime<Utc>,
    pub assigned_to: Vec<String>,
    pub created_by: String,
    pub attachments: Vec<String>,
    pub todo_checklist: Vec<ChecklistItem>,
    pub progress: u8,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Status string as read from storage, kept for tolerant reporting.
    /// Cleared whenever the status is rewritten.
    #[serde(skip)]
    pub stored_status: Option<String>,
}

impl Task {
    /// The stored status string when one was read, else the canonical name.
    pub fn status_label(&self) -> &str {
        self.stored_status.as_deref().unwrap_or(self.status.as_str())
    }

    pub fn completed_count(&self) -> usize {
        self.todo_checklist.iter().filter(|item| item.completed).count()
    }

    pub fn is_assigned(&self, user_id: &str) -> bool {
        self.assigned_to.iter().any(|id| id == user_id)
    }

    /// Not completed and due strictly before `now`.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status != TaskStatus::Completed && self.due_date < now
    }

    /// Every checklist assignee must also be assigned to the task.
    pub fn check_checklist_assignees(&self) -> Result<(), ApiError> {
        for item in &self.todo_checklist {
            if item.title.trim().is_empty() {
                return Err(ApiError::bad_request("Checklist items require a title"));
            }
            if let Some(assignee) = &item.assigned_to {
                if !self.is_assigned(assignee) {
                    return Err(ApiError::bad_request(format!(
                        "Checklist item \"{}\" is assigned to a user who is not assigned to the task",
                        item.title
                    )));
                }
            }
        }
        Ok(())
    }

    /// Build a new task from a create request. Title, project name and due
    /// date are required.
    pub fn from_create(
        payload: CreateTaskPayload,
        created_by: &str,
        now: DateTime<Utc>,
    ) -> Result<Task, ApiError> {
        let title = non_empty(payload.title);
        let project_name = non_empty(payload.project_name);
        let due_date = non_empty(payload.due_date);
        let (Some(title), Some(project_name), Some(due_date)) = (title, project_name, due_date) else {
            return Err(ApiError::bad_request(
                "Missing required fields: title, projectName, and dueDate are required",
            ));
        };

        let mut task = Task {
            task_id: uuid::Uuid::new_v4().to_string(),
            title,
            description: non_empty(payload.description),
            project_name,
            priority: payload.priority.unwrap_or_default(),
            status: TaskStatus::Pending,
            domain: parse_domain(payload.domain)?,
            due_date: parse_due_date(&due_date)?,
            assigned_to: dedup(payload.assigned_to.unwrap_or_default()),
            created_by: created_by.to_string(),
            attachments: payload.attachments.unwrap_or_default(),
            todo_checklist: Vec::new(),
            progress: 0,
            created_at: now,
            updated_at: now,
            stored_status: None,
        };

        if let Some(items) = payload.todo_checklist {
            apply_progress_update(&mut task, ProgressUpdate::Checklist(normalize_checklist(items)));
        }
        if let Some(status) = payload.status {
            apply_progress_update(&mut task, ProgressUpdate::Status(status));
        }

        task.check_checklist_assignees()?;
        Ok(task)
    }

    /// Replace the provided fields, leaving the rest unchanged. A supplied
    /// checklist replaces the stored one wholesale.
    pub fn apply_update(&mut self, payload: UpdateTaskPayload, now: DateTime<Utc>) -> Result<(), ApiError> {
        if let Some(title) = non_empty(payload.title) {
            self.title = title;
        }
        if let Some(description) = payload.description {
            self.description = Some(description).filter(|d| !d.trim().is_empty());
        }
        if let Some(project_name) = non_empty(payload.project_name) {
            self.project_name = project_name;
        }
        if let Some(priority) = payload.priority {
            self.priority = priority;
        }
        if payload.domain.is_some() {
            self.domain = parse_domain(payload.domain)?;
        }
        if let Some(due_date) = non_empty(payload.due_date) {
            self.due_date = parse_due_date(&due_date)?;
        }
        if let Some(assigned_to) = payload.assigned_to {
            self.assigned_to = dedup(assigned_to);
        }
        if let Some(attachments) = payload.attachments {
            self.attachments = attachments;
        }
        if let Some(items) = payload.todo_checklist {
            apply_progress_update(self, ProgressUpdate::Checklist(normalize_checklist(items)));
        }
        if let Some(status) = payload.status {
            apply_progress_update(self, ProgressUpdate::Status(status));
        }

        self.check_checklist_assignees()?;
        self.updated_at = now;
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskPayload {
    pub title: Option<String>,
    pub description: Option<String>,
    pub project_name: Option<String>,
    pub priority: Option<Priority>,
    pub domain: Option<String>,
    pub due_date: Option<String>,
    pub assigned_to: Option<Vec<String>>,
    pub attachments: Option<Vec<String>>,
    pub todo_checklist: Option<Vec<ChecklistItem>>,
    pub status: Option<TaskStatus>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskPayload {
    pub title: Option<String>,
    pub description: Option<String>,
    pub project_name: Option<String>,
    pub priority: Option<Priority>,
    pub domain: Option<String>,
    pub due_date: Option<String>,
    pub assigned_to: Option<Vec<String>>,
    pub attachments: Option<Vec<String>>,
    pub todo_checklist: Option<Vec<ChecklistItem>>,
    pub status: Option<TaskStatus>,
}

#[derive(Debug, Deserialize)]
pub struct StatusPayload {
    pub status: Option<TaskStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistPayload {
    pub todo_checklist: Vec<ChecklistItem>,
}

/// Accepts RFC 3339 timestamps and bare `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_due_date(raw: &str) -> Result<DateTime<Utc>, ApiError> {
    let raw = raw.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Ok(t.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| ApiError::bad_request(format!("Invalid dueDate: {}", raw)))
}

fn parse_domain(raw: Option<String>) -> Result<Option<TaskDomain>, ApiError> {
    match non_empty(raw) {
        None => Ok(None),
        Some(s) => TaskDomain::parse(&s)
            .map(Some)
            .ok_or_else(|| ApiError::bad_request(format!("Invalid domain: {}", s))),
    }
}

pub fn normalize_checklist(items: Vec<ChecklistItem>) -> Vec<ChecklistItem> {
    items
        .into_iter()
        .map(|item| ChecklistItem {
            title: item.title.trim().to_string(),
            assigned_to: item.assigned_to.filter(|a| !a.trim().is_empty()),
            completed: item.completed,
        })
        .collect()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn dedup(ids: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(ids.len());
    for id in ids {
        if !id.is_empty() && !out.contains(&id) {
            out.push(id);
        }
    }
    out
}
