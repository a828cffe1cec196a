use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoClient;
use chrono::Utc;

use super::model::{project_key, CreateProjectPayload, Project};
use crate::dynamo::{self, get_bool, get_s, get_time, Item};
use crate::error::ApiError;

const PROJECT_PK: &str = "PROJECT";

pub fn project_to_item(project: &Project) -> Item {
    let mut item = dynamo::key(PROJECT_PK, format!("PROJECT#{}", project_key(&project.name)));
    item.insert("project_id".to_string(), AttributeValue::S(project.project_id.clone()));
    item.insert("name".to_string(), AttributeValue::S(project.name.clone()));
    if let Some(description) = &project.description {
        item.insert("description".to_string(), AttributeValue::S(description.clone()));
    }
    item.insert("is_active".to_string(), AttributeValue::Bool(project.is_active));
    item.insert("created_by".to_string(), AttributeValue::S(project.created_by.clone()));
    item.insert("created_at".to_string(), dynamo::time(&project.created_at));
    item.insert("updated_at".to_string(), dynamo::time(&project.updated_at));
    item
}

pub fn project_from_item(item: &Item) -> Option<Project> {
    let created_at = get_time(item, "created_at").unwrap_or_else(Utc::now);
    Some(Project {
        project_id: get_s(item, "project_id")?,
        name: get_s(item, "name")?,
        description: get_s(item, "description"),
        is_active: get_bool(item, "is_active").unwrap_or(true),
        created_by: get_s(item, "created_by").unwrap_or_default(),
        created_at,
        updated_at: get_time(item, "updated_at").unwrap_or(created_at),
    })
}

/// Create a project; the name is claimed with a conditional put so a
/// duplicate (ignoring case) is a Conflict.
pub async fn create_project(
    client: &DynamoClient,
    table_name: &str,
    created_by: &str,
    payload: CreateProjectPayload,
) -> Result<Project, ApiError> {
    let name = payload
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::bad_request("Project name is required"))?;

    let now = Utc::now();
    let project = Project {
        project_id: uuid::Uuid::new_v4().to_string(),
        name,
        description: payload.description.filter(|d| !d.trim().is_empty()),
        is_active: true,
        created_by: created_by.to_string(),
        created_at: now,
        updated_at: now,
    };

    client
        .put_item()
        .table_name(table_name)
        .set_item(Some(project_to_item(&project)))
        .condition_expression("attribute_not_exists(SK)")
        .send()
        .await
        .map_err(|e| {
            if e
                .as_service_error()
                .map(|se| se.is_conditional_check_failed_exception())
                .unwrap_or(false)
            {
                ApiError::conflict("Project already exists")
            } else {
                ApiError::storage("put_item", e)
            }
        })?;

    Ok(project)
}

/// All projects, ordered by name.
pub async fn load_projects(client: &DynamoClient, table_name: &str) -> Result<Vec<Project>, ApiError> {
    let items = dynamo::query_partition(client, table_name, PROJECT_PK, "PROJECT#").await?;
    let mut projects: Vec<Project> = items.iter().filter_map(project_from_item).collect();
    projects.sort_by_key(|p| project_key(&p.name));
    Ok(projects)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_names_share_a_key_regardless_of_case() {
        let now = Utc::now();
        let a = Project {
            project_id: "p1".into(),
            name: "Apollo".into(),
            description: None,
            is_active: true,
            created_by: "admin".into(),
            created_at: now,
            updated_at: now,
        };
        let mut b = a.clone();
        b.name = "  APOLLO ".into();
        assert_eq!(get_s(&project_to_item(&a), "SK"), get_s(&project_to_item(&b), "SK"));
    }

    #[test]
    fn project_item_round_trip() {
        let now = Utc::now();
        let project = Project {
            project_id: "p2".into(),
            name: "Hermes".into(),
            description: Some("Delivery".into()),
            is_active: true,
            created_by: "admin".into(),
            created_at: now,
            updated_at: now,
        };
        let back = project_from_item(&project_to_item(&project)).unwrap();
        assert_eq!(back.name, "Hermes");
        assert_eq!(back.description.as_deref(), Some("Delivery"));
        assert!(back.is_active);
    }
}
