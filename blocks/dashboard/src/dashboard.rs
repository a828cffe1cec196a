use aws_sdk_dynamodb::Client as DynamoClient;
use chrono::Utc;
use lambda_http::http::StatusCode;
use taskboard_atoms::http::{json_response, HandlerResult};
use taskboard_atoms::{tasks, Caller};

use crate::overview::build_dashboard;

/// GET /api/tasks/dashboard-data (admin, global)
pub async fn dashboard_data(client: &DynamoClient, table_name: &str, caller: &Caller) -> HandlerResult {
    caller.require_admin()?;
    let tasks = tasks::load_tasks(client, table_name).await?;
    json_response(StatusCode::OK, &build_dashboard(&tasks, Utc::now()))
}

/// GET /api/tasks/user-dashboard-data (caller's assignments only)
pub async fn user_dashboard_data(client: &DynamoClient, table_name: &str, caller: &Caller) -> HandlerResult {
    let all = tasks::load_tasks(client, table_name).await?;
    let own: Vec<_> = all.into_iter().filter(|t| t.is_assigned(&caller.user_id)).collect();
    json_response(StatusCode::OK, &build_dashboard(&own, Utc::now()))
}
