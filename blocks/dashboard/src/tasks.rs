use aws_sdk_dynamodb::Client as DynamoClient;
use chrono::Utc;
use lambda_http::http::StatusCode;
use taskboard_atoms::http::{json_response, message_response, parse_body, HandlerResult};
use taskboard_atoms::tasks::{
    self, apply_progress_update, normalize_checklist, ChecklistPayload, CreateTaskPayload, ProgressUpdate,
    StatusPayload, Task, UpdateTaskPayload,
};
use taskboard_atoms::{users, ApiError, Caller};

use crate::join::UserDirectory;
use crate::listing::{filter_with_summary, parse_status_filter, scope_tasks};
use crate::types::{TaskListResponse, TaskMessage};

async fn directory(client: &DynamoClient, table_name: &str) -> Result<UserDirectory, ApiError> {
    Ok(UserDirectory::new(users::load_users(client, table_name).await?))
}

/// GET /api/tasks
pub async fn list_tasks(
    client: &DynamoClient,
    table_name: &str,
    caller: &Caller,
    status: Option<&str>,
) -> HandlerResult {
    let filter = parse_status_filter(status)?;
    let scoped = scope_tasks(tasks::load_tasks(client, table_name).await?, caller);
    let (page, status_summary) = filter_with_summary(scoped, filter);

    let directory = directory(client, table_name).await?;
    let tasks = page.into_iter().map(|t| directory.populate_with_count(t)).collect();

    json_response(StatusCode::OK, &TaskListResponse { tasks, status_summary })
}

/// GET /api/tasks/{id}
pub async fn get_task(client: &DynamoClient, table_name: &str, caller: &Caller, task_id: &str) -> HandlerResult {
    let task = tasks::get_task(client, table_name, task_id).await?;
    caller.require_task_access(&task)?;

    let directory = directory(client, table_name).await?;
    json_response(StatusCode::OK, &directory.populate(task))
}

/// POST /api/tasks
pub async fn create_task(client: &DynamoClient, table_name: &str, caller: &Caller, body: &[u8]) -> HandlerResult {
    caller.require_admin()?;
    let payload: CreateTaskPayload = parse_body(body)?;
    let task = Task::from_create(payload, &caller.user_id, Utc::now())?;

    let directory = directory(client, table_name).await?;
    directory.check_assignees(&task.assigned_to)?;
    tasks::save_task(client, table_name, &task).await?;

    tracing::info!("Created task {} with {} assignees", task.task_id, task.assigned_to.len());
    json_response(
        StatusCode::CREATED,
        &TaskMessage { message: "Task created successfully", task: directory.populate(task) },
    )
}

/// PUT /api/tasks/{id}
pub async fn update_task(
    client: &DynamoClient,
    table_name: &str,
    caller: &Caller,
    task_id: &str,
    body: &[u8],
) -> HandlerResult {
    caller.require_admin()?;
    let payload: UpdateTaskPayload = parse_body(body)?;
    let reassigned = payload.assigned_to.is_some();

    let mut task = tasks::get_task(client, table_name, task_id).await?;
    task.apply_update(payload, Utc::now())?;

    let directory = directory(client, table_name).await?;
    if reassigned {
        directory.check_assignees(&task.assigned_to)?;
    }
    tasks::save_task(client, table_name, &task).await?;

    json_response(
        StatusCode::OK,
        &TaskMessage { message: "Task updated successfully", task: directory.populate(task) },
    )
}

/// DELETE /api/tasks/{id}
pub async fn delete_task(client: &DynamoClient, table_name: &str, caller: &Caller, task_id: &str) -> HandlerResult {
    caller.require_admin()?;
    tasks::delete_task(client, table_name, task_id).await?;
    tracing::info!("Deleted task {}", task_id);
    message_response(StatusCode::OK, "Task deleted successfully")
}

/// PUT /api/tasks/{id}/status
pub async fn update_task_status(
    client: &DynamoClient,
    table_name: &str,
    caller: &Caller,
    task_id: &str,
    body: &[u8],
) -> HandlerResult {
    let payload: StatusPayload = parse_body(body)?;
    let status = payload.status.ok_or_else(|| ApiError::bad_request("Status is required"))?;

    let mut task = tasks::get_task(client, table_name, task_id).await?;
    caller.require_task_access(&task)?;

    apply_progress_update(&mut task, ProgressUpdate::Status(status));
    task.updated_at = Utc::now();
    tasks::save_task(client, table_name, &task).await?;

    let directory = directory(client, table_name).await?;
    json_response(
        StatusCode::OK,
        &TaskMessage { message: "Task status updated successfully", task: directory.populate(task) },
    )
}

/// PUT /api/tasks/{id}/todo
pub async fn update_task_checklist(
    client: &DynamoClient,
    table_name: &str,
    caller: &Caller,
    task_id: &str,
    body: &[u8],
) -> HandlerResult {
    let payload: ChecklistPayload = parse_body(body)?;

    let mut task = tasks::get_task(client, table_name, task_id).await?;
    caller.require_task_access(&task)?;

    apply_progress_update(&mut task, ProgressUpdate::Checklist(normalize_checklist(payload.todo_checklist)));
    task.check_checklist_assignees()?;
    task.updated_at = Utc::now();
    tasks::save_task(client, table_name, &task).await?;

    let directory = directory(client, table_name).await?;
    json_response(
        StatusCode::OK,
        &TaskMessage { message: "Task checklist updated successfully", task: directory.populate(task) },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskboard_atoms::tasks::TaskStatus;

    #[test]
    fn checklist_payload_requires_the_array() {
        let err = parse_body::<ChecklistPayload>(b"{}").unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));

        let payload: ChecklistPayload =
            parse_body(br#"{"todoChecklist":[{"title":"a","completed":true,"assignedTo":"u1"}]}"#).unwrap();
        assert_eq!(payload.todo_checklist[0].assigned_to.as_deref(), Some("u1"));
    }

    #[test]
    fn status_payload_is_strict() {
        let ok: StatusPayload = parse_body(br#"{"status":"In Progress"}"#).unwrap();
        assert_eq!(ok.status, Some(TaskStatus::InProgress));
        assert!(parse_body::<StatusPayload>(br#"{"status":"ongoing"}"#).is_err());
        let empty: StatusPayload = parse_body(b"").unwrap();
        assert!(empty.status.is_none());
    }
}
