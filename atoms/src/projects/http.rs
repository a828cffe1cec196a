use aws_sdk_dynamodb::Client as DynamoClient;
use lambda_http::http::StatusCode;

use super::model::CreateProjectPayload;
use super::service;
use crate::access::Caller;
use crate::http::{json_response, parse_body, HandlerResult};

/// POST /api/projects (admin)
pub async fn create_project_handler(
    client: &DynamoClient,
    table_name: &str,
    caller: &Caller,
    body: &[u8],
) -> HandlerResult {
    caller.require_admin()?;
    let payload: CreateProjectPayload = parse_body(body)?;
    let project = service::create_project(client, table_name, &caller.user_id, payload).await?;
    tracing::info!("Project {} created by {}", project.project_id, caller.user_id);
    json_response(StatusCode::CREATED, &project)
}

/// GET /api/projects
pub async fn list_projects_handler(client: &DynamoClient, table_name: &str) -> HandlerResult {
    let projects = service::load_projects(client, table_name).await?;
    json_response(StatusCode::OK, &projects)
}
