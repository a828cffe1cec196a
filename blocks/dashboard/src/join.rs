use std::collections::HashMap;

use taskboard_atoms::tasks::Task;
use taskboard_atoms::users::{User, UserSummary};
use taskboard_atoms::ApiError;

use crate::types::TaskView;

/// Users keyed by id, built once per request from a full user load.
pub struct UserDirectory {
    users: HashMap<String, User>,
}

impl UserDirectory {
    pub fn new(users: Vec<User>) -> Self {
        Self {
            users: users.into_iter().map(|u| (u.user_id.clone(), u)).collect(),
        }
    }

    pub fn get(&self, user_id: &str) -> Option<&User> {
        self.users.get(user_id)
    }

    /// Assignee summaries in task order. Ids without a user are dropped.
    pub fn summaries(&self, ids: &[String]) -> Vec<UserSummary> {
        ids.iter()
            .filter_map(|id| self.users.get(id))
            .map(UserSummary::from)
            .collect()
    }

    /// Every assignee id must name an existing user.
    pub fn check_assignees(&self, ids: &[String]) -> Result<(), ApiError> {
        match ids.iter().find(|id| !self.users.contains_key(id.as_str())) {
            Some(missing) => Err(ApiError::bad_request(format!(
                "Assigned user {} does not exist",
                missing
            ))),
            None => Ok(()),
        }
    }

    pub fn populate(&self, task: Task) -> TaskView {
        let assigned_to = self.summaries(&task.assigned_to);
        into_view(task, assigned_to, None)
    }

    /// Same as [`populate`](Self::populate) plus the completed checklist count.
    pub fn populate_with_count(&self, task: Task) -> TaskView {
        let assigned_to = self.summaries(&task.assigned_to);
        let count = task.completed_count();
        into_view(task, assigned_to, Some(count))
    }
}

fn into_view(task: Task, assigned_to: Vec<UserSummary>, completed_todo_count: Option<usize>) -> TaskView {
    TaskView {
        task_id: task.task_id,
        title: task.title,
        description: task.description,
        project_name: task.project_name,
        priority: task.priority,
        status: task.status,
        domain: task.domain,
        due_date: task.due_date,
        assigned_to,
        created_by: task.created_by,
        attachments: task.attachments,
        todo_checklist: task.todo_checklist,
        progress: task.progress,
        created_at: task.created_at,
        updated_at: task.updated_at,
        completed_todo_count,
    }
}
