use aws_sdk_dynamodb::Client as DynamoClient;
use chrono::Utc;
use lambda_http::http::StatusCode;
use taskboard_atoms::dynamo::batch_delete;
use taskboard_atoms::http::{json_response, message_response, HandlerResult};
use taskboard_atoms::tasks::{self, Task};
use taskboard_atoms::users::{self, User};
use taskboard_atoms::Caller;

use crate::cascade::plan_user_removal;
use crate::reports::counts_for;
use crate::types::UserWithTaskCounts;

/// Attach per-status counts and order admins first, newest first within a role.
pub fn with_task_counts(users: Vec<User>, tasks: &[Task]) -> Vec<UserWithTaskCounts> {
    let mut rows: Vec<UserWithTaskCounts> = users
        .into_iter()
        .map(|user| {
            let counts = counts_for(&user.user_id, tasks);
            UserWithTaskCounts {
                user,
                pending_tasks: counts.pending,
                in_progress_tasks: counts.in_progress,
                completed_tasks: counts.completed,
            }
        })
        .collect();
    rows.sort_by(|a, b| {
        a.user
            .role
            .cmp(&b.user.role)
            .then_with(|| b.user.created_at.cmp(&a.user.created_at))
    });
    rows
}

/// GET /api/users
pub async fn list_users(client: &DynamoClient, table_name: &str) -> HandlerResult {
    let users = users::load_users(client, table_name).await?;
    let tasks = tasks::load_tasks(client, table_name).await?;
    json_response(StatusCode::OK, &with_task_counts(users, &tasks))
}

/// GET /api/users/{id}
pub async fn get_user(client: &DynamoClient, table_name: &str, user_id: &str) -> HandlerResult {
    let user = users::get_user(client, table_name, user_id).await?;
    json_response(StatusCode::OK, &user)
}

/// DELETE /api/users/{id}
///
/// Tasks the user held alone are removed; shared tasks keep running without
/// them. The user record and email claim go last.
pub async fn delete_user(client: &DynamoClient, table_name: &str, caller: &Caller, user_id: &str) -> HandlerResult {
    caller.require_admin()?;
    let user = users::get_user(client, table_name, user_id).await?;

    let plan = plan_user_removal(tasks::load_tasks(client, table_name).await?, &user.user_id);
    let keys: Vec<_> = plan.delete.iter().map(|id| tasks::task_key(id)).collect();
    batch_delete(client, table_name, &keys).await?;

    let (removed, reassigned) = (plan.delete.len(), plan.rewrite.len());
    let now = Utc::now();
    for mut task in plan.rewrite {
        task.updated_at = now;
        tasks::save_task(client, table_name, &task).await?;
    }

    users::delete_user(client, table_name, &user).await?;
    tracing::info!(
        "Deleted user {}: {} tasks removed, {} tasks reassigned",
        user.user_id,
        removed,
        reassigned
    );
    message_response(StatusCode::OK, "User deleted successfully")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::join::fixtures::{task, user};
    use chrono::Duration;
    use taskboard_atoms::tasks::TaskStatus;
    use taskboard_atoms::users::Role;

    #[test]
    fn admins_first_then_newest() {
        let mut old_member = user("m-old", "Old", Role::Member);
        old_member.created_at = Utc::now() - Duration::days(10);
        let new_member = user("m-new", "New", Role::Member);
        let mut admin = user("a", "Boss", Role::Admin);
        admin.created_at = Utc::now() - Duration::days(30);

        let rows = with_task_counts(vec![old_member, admin, new_member], &[]);
        let ids: Vec<_> = rows.iter().map(|r| r.user.user_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "m-new", "m-old"]);
    }

    #[test]
    fn counts_are_flattened_into_the_user() {
        let now = Utc::now();
        let tasks = vec![
            task("t1", TaskStatus::Pending, &["u1"], now),
            task("t2", TaskStatus::InProgress, &["u1"], now),
            task("t3", TaskStatus::Completed, &["u2"], now),
        ];
        let rows = with_task_counts(vec![user("u1", "Ada", Role::Member)], &tasks);
        let json = serde_json::to_value(&rows[0]).unwrap();
        assert_eq!(json["_id"], "u1");
        assert_eq!(json["name"], "Ada");
        assert_eq!(json["pendingTasks"], 1);
        assert_eq!(json["inProgressTasks"], 1);
        assert_eq!(json["completedTasks"], 0);
        assert!(json.get("passwordHash").is_none());
    }
}
