use crate::error::ApiError;
use crate::tasks::Task;
use crate::users::{Role, User};

/// The authenticated user behind a request.
#[derive(Debug, Clone, PartialEq)]
pub struct Caller {
    pub user_id: String,
    pub role: Role,
}

impl From<&User> for Caller {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.user_id.clone(),
            role: user.role,
        }
    }
}

impl Caller {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ApiError::forbidden("Access denied, admin only"))
        }
    }

    /// Admins see every task; members only the ones they are assigned to.
    pub fn can_view(&self, task: &Task) -> bool {
        self.is_admin() || task.is_assigned(&self.user_id)
    }

    /// Status and checklist writes follow the same rule as visibility.
    pub fn require_task_access(&self, task: &Task) -> Result<(), ApiError> {
        if self.can_view(task) {
            Ok(())
        } else {
            Err(ApiError::forbidden("not assigned to this task"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::{CreateTaskPayload, Task};
    use chrono::Utc;

    fn task_for(assignees: &[&str]) -> Task {
        Task::from_create(
            CreateTaskPayload {
                title: Some("t".into()),
                project_name: Some("p".into()),
                due_date: Some("2030-01-01".into()),
                assigned_to: Some(assignees.iter().map(|s| s.to_string()).collect()),
                ..Default::default()
            },
            "admin",
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn members_only_touch_assigned_tasks() {
        let member = Caller { user_id: "m1".into(), role: Role::Member };
        assert!(member.require_task_access(&task_for(&["m1", "m2"])).is_ok());
        assert!(matches!(
            member.require_task_access(&task_for(&["m2"])),
            Err(ApiError::Forbidden(_))
        ));
        assert!(matches!(member.require_task_access(&task_for(&[])), Err(ApiError::Forbidden(_))));
    }

    #[test]
    fn admins_touch_everything() {
        let admin = Caller { user_id: "a1".into(), role: Role::Admin };
        assert!(admin.require_task_access(&task_for(&[])).is_ok());
        assert!(admin.require_admin().is_ok());
        let member = Caller { user_id: "m1".into(), role: Role::Member };
        assert!(member.require_admin().is_err());
    }
}
