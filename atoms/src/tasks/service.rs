use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoClient;
use chrono::Utc;
use std::collections::HashMap;

use super::model::{ChecklistItem, Priority, Task, TaskDomain, TaskStatus};
use crate::dynamo::{self, get_bool, get_n, get_s, get_string_list, get_time, Item};
use crate::error::ApiError;

const TASK_PK: &str = "TASK";

fn task_sk(task_id: &str) -> String {
    format!("TASK#{}", task_id)
}

pub fn task_key(task_id: &str) -> Item {
    dynamo::key(TASK_PK, task_sk(task_id))
}

fn checklist_to_attr(items: &[ChecklistItem]) -> AttributeValue {
    AttributeValue::L(
        items
            .iter()
            .map(|item| {
                let mut m = HashMap::new();
                m.insert("title".to_string(), AttributeValue::S(item.title.clone()));
                m.insert("completed".to_string(), AttributeValue::Bool(item.completed));
                if let Some(assignee) = &item.assigned_to {
                    m.insert("assigned_to".to_string(), AttributeValue::S(assignee.clone()));
                }
                AttributeValue::M(m)
            })
            .collect(),
    )
}

fn checklist_from_attr(item: &Item) -> Vec<ChecklistItem> {
    item.get("todo_checklist")
        .and_then(|v| v.as_l().ok())
        .map(|list| {
            list.iter()
                .filter_map(|v| v.as_m().ok())
                .map(|m| ChecklistItem {
                    title: get_s(m, "title").unwrap_or_default(),
                    assigned_to: get_s(m, "assigned_to"),
                    completed: get_bool(m, "completed").unwrap_or(false),
                })
                .collect()
        })
        .unwrap_or_default()
}

pub fn task_to_item(task: &Task) -> Item {
    let mut item = task_key(&task.task_id);
    item.insert("title".to_string(), AttributeValue::S(task.title.clone()));
    if let Some(description) = &task.description {
        item.insert("description".to_string(), AttributeValue::S(description.clone()));
    }
    item.insert("project_name".to_string(), AttributeValue::S(task.project_name.clone()));
    item.insert("priority".to_string(), AttributeValue::S(task.priority.as_str().to_string()));
    item.insert("status".to_string(), AttributeValue::S(task.status.as_str().to_string()));
    if let Some(domain) = &task.domain {
        item.insert("domain".to_string(), AttributeValue::S(domain.as_str().to_string()));
    }
    item.insert("due_date".to_string(), dynamo::time(&task.due_date));
    item.insert("assigned_to".to_string(), dynamo::string_list(&task.assigned_to));
    item.insert("created_by".to_string(), AttributeValue::S(task.created_by.clone()));
    item.insert("attachments".to_string(), dynamo::string_list(&task.attachments));
    item.insert("todo_checklist".to_string(), checklist_to_attr(&task.todo_checklist));
    item.insert("progress".to_string(), AttributeValue::N(task.progress.to_string()));
    item.insert("created_at".to_string(), dynamo::time(&task.created_at));
    item.insert("updated_at".to_string(), dynamo::time(&task.updated_at));
    item
}

/// Map a stored item back to a task. Status strings go through the legacy
/// synonym table; anything unrecognised reads as Pending.
pub fn task_from_item(item: &Item) -> Option<Task> {
    let sk = get_s(item, "SK")?;
    let task_id = sk.strip_prefix("TASK#")?.to_string();
    let created_at = get_time(item, "created_at").unwrap_or_else(Utc::now);

    let stored_status = get_s(item, "status");
    let status = match &stored_status {
        Some(raw) => TaskStatus::from_loose(raw).unwrap_or_else(|| {
            tracing::warn!("Unknown status \"{}\" on task {}, reading as Pending", raw, task_id);
            TaskStatus::Pending
        }),
        None => TaskStatus::Pending,
    };

    Some(Task {
        title: get_s(item, "title").unwrap_or_default(),
        description: get_s(item, "description"),
        project_name: get_s(item, "project_name").unwrap_or_default(),
        priority: get_s(item, "priority")
            .and_then(|p| Priority::parse(&p))
            .unwrap_or_default(),
        status,
        domain: get_s(item, "domain").and_then(|d| TaskDomain::parse(&d)),
        due_date: get_time(item, "due_date").unwrap_or(created_at),
        assigned_to: get_string_list(item, "assigned_to"),
        created_by: get_s(item, "created_by").unwrap_or_default(),
        attachments: get_string_list(item, "attachments"),
        todo_checklist: checklist_from_attr(item),
        progress: get_n::<u8>(item, "progress").unwrap_or(0).min(100),
        created_at,
        updated_at: get_time(item, "updated_at").unwrap_or(created_at),
        stored_status,
        task_id,
    })
}

/// Load every task, newest first.
pub async fn load_tasks(client: &DynamoClient, table_name: &str) -> Result<Vec<Task>, ApiError> {
    let items = dynamo::query_partition(client, table_name, TASK_PK, "TASK#").await?;
    let mut tasks: Vec<Task> = items.iter().filter_map(task_from_item).collect();
    tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(tasks)
}

pub async fn get_task(client: &DynamoClient, table_name: &str, task_id: &str) -> Result<Task, ApiError> {
    let result = client
        .get_item()
        .table_name(table_name)
        .set_key(Some(task_key(task_id)))
        .send()
        .await
        .map_err(|e| ApiError::storage("get_item", e))?;

    result
        .item()
        .and_then(task_from_item)
        .ok_or_else(|| ApiError::not_found("Task not found"))
}

/// Write the whole task document. Concurrent writers are last-writer-wins.
pub async fn save_task(client: &DynamoClient, table_name: &str, task: &Task) -> Result<(), ApiError> {
    client
        .put_item()
        .table_name(table_name)
        .set_item(Some(task_to_item(task)))
        .send()
        .await
        .map_err(|e| ApiError::storage("put_item", e))?;
    Ok(())
}

pub async fn delete_task(client: &DynamoClient, table_name: &str, task_id: &str) -> Result<(), ApiError> {
    client
        .delete_item()
        .table_name(table_name)
        .set_key(Some(task_key(task_id)))
        .condition_expression("attribute_exists(SK)")
        .send()
        .await
        .map_err(|e| {
            if e
                .as_service_error()
                .map(|se| se.is_conditional_check_failed_exception())
                .unwrap_or(false)
            {
                ApiError::not_found("Task not found")
            } else {
                ApiError::storage("delete_item", e)
            }
        })?;
    Ok(())
}
