use std::sync::Arc;

use chrono::Utc;
use dashboard_block::{dashboard, reports, tasks, users};
use lambda_http::http::header::{HeaderMap, HeaderValue};
use lambda_http::{
    http::{Method, StatusCode},
    Body, Error, Request, RequestExt, Response,
};
use taskboard_atoms::http::{error_response, json_response, HandlerResult};
use taskboard_atoms::{media, projects};
use taskboard_shared::{auth, AppState, Config};

fn with_cors_headers(mut resp: Response<Body>, client_url: &str) -> Response<Body> {
    let headers = resp.headers_mut();
    headers.insert(
        "Access-Control-Allow-Origin",
        HeaderValue::from_str(client_url).unwrap_or_else(|_| HeaderValue::from_static("*")),
    );
    headers.insert(
        "Access-Control-Allow-Methods",
        HeaderValue::from_static("GET,POST,PUT,DELETE,OPTIONS"),
    );
    headers.insert(
        "Access-Control-Allow-Headers",
        HeaderValue::from_static("Content-Type,Authorization"),
    );
    resp
}

fn finalize_response(resp: HandlerResult, client_url: &str) -> Response<Body> {
    let resp = resp.unwrap_or_else(|e| error_response(&e));
    with_cors_headers(resp, client_url)
}

fn not_found(method: &Method, path: &str) -> HandlerResult {
    tracing::warn!("No route for {} {}", method, path);
    json_response(StatusCode::NOT_FOUND, &serde_json::json!({ "message": "Route not found" }))
}

fn health() -> HandlerResult {
    json_response(
        StatusCode::OK,
        &serde_json::json!({
            "message": "Task Manager API is running",
            "status": "success",
            "timestamp": Utc::now().to_rfc3339(),
        }),
    )
}

fn path_parts(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Base for image URLs: configured value, else `https://{Host}`.
fn public_base_url(config: &Config, headers: &HeaderMap) -> String {
    if let Some(base) = &config.public_base_url {
        return base.clone();
    }
    let host = headers
        .get("Host")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    format!("https://{}", host)
}

/// Main Lambda handler: preflight, public routes, then bearer-authenticated routes.
pub(crate) async fn function_handler(event: Request, state: Arc<AppState>) -> Result<Response<Body>, Error> {
    let method = event.method();
    let path = event.uri().path();
    tracing::info!("API invoked - Method: {} Path: {}", method, path);

    let client_url = state.config.client_url.as_str();
    if *method == Method::OPTIONS {
        let resp = Response::builder()
            .status(StatusCode::OK)
            .body(Body::Empty)
            .map_err(Box::new)?;
        return Ok(with_cors_headers(resp, client_url));
    }

    Ok(finalize_response(route(&event, &state).await, client_url))
}

async fn route(event: &Request, state: &AppState) -> HandlerResult {
    let method = event.method();
    let path = event.uri().path();
    let body: &[u8] = event.body();
    let parts = path_parts(path);

    let dynamo = &state.dynamo_client;
    let config = &state.config;
    let table = config.table_name.as_str();

    // Public routes
    match (method, parts.as_slice()) {
        (&Method::GET, []) => return health(),
        (&Method::POST, ["api", "auth", "register"]) => return auth::register(dynamo, config, body).await,
        (&Method::POST, ["api", "auth", "login"]) => return auth::login(dynamo, config, body).await,
        (&Method::GET, ["uploads", name]) => {
            return media::serve_image_handler(&state.s3_client, &config.upload_bucket, name).await
        }
        (_, ["api", ..]) => {}
        _ => return not_found(method, path),
    }

    let caller = auth::authenticate_request(dynamo, config, event.headers()).await?;

    match (method, parts.as_slice()) {
        // --- AUTH ---
        (&Method::GET, ["api", "auth", "profile"]) => auth::get_profile(dynamo, table, &caller).await,
        (&Method::PUT, ["api", "auth", "profile"]) => auth::update_profile(dynamo, config, &caller, body).await,
        (&Method::POST, ["api", "auth", "upload-image"]) => {
            let file_name = event.headers().get("X-File-Name").and_then(|v| v.to_str().ok());
            let base_url = public_base_url(config, event.headers());
            media::upload_image_handler(&state.s3_client, &config.upload_bucket, &base_url, file_name, body).await
        }

        // --- USERS ---
        (&Method::GET, ["api", "users"]) => users::list_users(dynamo, table).await,
        (&Method::GET, ["api", "users", user_id]) => users::get_user(dynamo, table, user_id).await,
        (&Method::DELETE, ["api", "users", user_id]) => users::delete_user(dynamo, table, &caller, user_id).await,

        // --- TASKS ---
        (&Method::GET, ["api", "tasks", "dashboard-data"]) => dashboard::dashboard_data(dynamo, table, &caller).await,
        (&Method::GET, ["api", "tasks", "user-dashboard-data"]) => {
            dashboard::user_dashboard_data(dynamo, table, &caller).await
        }
        (&Method::GET, ["api", "tasks"]) => {
            let params = event.query_string_parameters_ref();
            let status = params.and_then(|p| p.first("status"));
            tasks::list_tasks(dynamo, table, &caller, status).await
        }
        (&Method::POST, ["api", "tasks"]) => tasks::create_task(dynamo, table, &caller, body).await,
        (&Method::GET, ["api", "tasks", task_id]) => tasks::get_task(dynamo, table, &caller, task_id).await,
        (&Method::PUT, ["api", "tasks", task_id]) => tasks::update_task(dynamo, table, &caller, task_id, body).await,
        (&Method::DELETE, ["api", "tasks", task_id]) => tasks::delete_task(dynamo, table, &caller, task_id).await,
        (&Method::PUT, ["api", "tasks", task_id, "status"]) => {
            tasks::update_task_status(dynamo, table, &caller, task_id, body).await
        }
        (&Method::PUT, ["api", "tasks", task_id, "todo"]) => {
            tasks::update_task_checklist(dynamo, table, &caller, task_id, body).await
        }

        // --- PROJECTS ---
        (&Method::GET, ["api", "projects"]) => projects::list_projects_handler(dynamo, table).await,
        (&Method::POST, ["api", "projects"]) => projects::create_project_handler(dynamo, table, &caller, body).await,

        // --- REPORTS ---
        (&Method::GET, ["api", "reports", "export", "tasks"]) => {
            reports::export_tasks_report(dynamo, table, &caller).await
        }
        (&Method::GET, ["api", "reports", "export", "users"]) => {
            reports::export_users_report(dynamo, table, &caller).await
        }

        _ => not_found(method, path),
    }
}
