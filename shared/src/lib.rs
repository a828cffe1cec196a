pub mod auth;
pub mod config;
pub mod password;
pub mod token;

use aws_sdk_dynamodb::Client as DynamoClient;
use aws_sdk_s3::Client as S3Client;

pub use config::{Config, ConfigError};

/// Clients and configuration shared by every invocation of a warm Lambda.
pub struct AppState {
    pub dynamo_client: DynamoClient,
    pub s3_client: S3Client,
    pub config: Config,
}

impl AppState {
    pub async fn new() -> Result<Self, ConfigError> {
        let config = Config::load()?;
        let aws_config = aws_config::load_from_env().await;
        tracing::info!("Using table {} and bucket {}", config.table_name, config.upload_bucket);

        Ok(Self {
            dynamo_client: DynamoClient::new(&aws_config),
            s3_client: S3Client::new(&aws_config),
            config,
        })
    }
}
