use taskboard_atoms::tasks::Task;

/// What removing a user does to the task table.
#[derive(Debug, Default)]
pub struct RemovalPlan {
    /// Tasks whose only assignee was the removed user.
    pub delete: Vec<String>,
    /// Shared tasks with the user pulled from `assignedTo` and the checklist.
    pub rewrite: Vec<Task>,
}

pub fn plan_user_removal(tasks: Vec<Task>, user_id: &str) -> RemovalPlan {
    let mut plan = RemovalPlan::default();
    for mut task in tasks {
        if !task.is_assigned(user_id) {
            continue;
        }
        if task.assigned_to.iter().all(|id| id == user_id) {
            plan.delete.push(task.task_id);
            continue;
        }
        task.assigned_to.retain(|id| id != user_id);
        for item in &mut task.todo_checklist {
            if item.assigned_to.as_deref() == Some(user_id) {
                item.assigned_to = None;
            }
        }
        plan.rewrite.push(task);
    }
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::join::fixtures::task;
    use chrono::Utc;
    use taskboard_atoms::tasks::{ChecklistItem, TaskStatus};

    #[test]
    fn sole_assignee_tasks_are_deleted_shared_ones_survive() {
        let now = Utc::now();
        let mut shared = task("shared", TaskStatus::InProgress, &["gone", "stays"], now);
        shared.todo_checklist = vec![
            ChecklistItem { title: "a".into(), assigned_to: Some("gone".into()), completed: false },
            ChecklistItem { title: "b".into(), assigned_to: Some("stays".into()), completed: true },
        ];
        let tasks = vec![
            task("solo", TaskStatus::Pending, &["gone"], now),
            shared,
            task("other", TaskStatus::Pending, &["stays"], now),
        ];

        let plan = plan_user_removal(tasks, "gone");
        assert_eq!(plan.delete, vec!["solo"]);
        assert_eq!(plan.rewrite.len(), 1);
        let rewritten = &plan.rewrite[0];
        assert_eq!(rewritten.assigned_to, vec!["stays"]);
        assert_eq!(rewritten.todo_checklist[0].assigned_to, None);
        assert_eq!(rewritten.todo_checklist[1].assigned_to.as_deref(), Some("stays"));
    }

    #[test]
    fn unrelated_tasks_are_untouched() {
        let plan = plan_user_removal(vec![task("t", TaskStatus::Pending, &[], Utc::now())], "gone");
        assert!(plan.delete.is_empty());
        assert!(plan.rewrite.is_empty());
    }
}
