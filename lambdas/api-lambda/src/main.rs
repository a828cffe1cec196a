use std::sync::Arc;

use lambda_http::{run, service_fn, Error, Request};
use taskboard_shared::AppState;
use tracing_subscriber::EnvFilter;

mod http_handler;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .without_time()
        .with_target(false)
        .init();

    let state = Arc::new(AppState::new().await?);

    run(service_fn(move |event: Request| {
        let state = Arc::clone(&state);
        async move { http_handler::function_handler(event, state).await }
    }))
    .await
}
