use std::env;

use thiserror::Error;
use tracing::{info, warn};

const DEFAULT_TABLE_NAME: &str = "taskboard";
const DEFAULT_CLIENT_URL: &str = "*";
const DEFAULT_UPLOAD_BUCKET: &str = "taskboard-uploads";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
}

/// Process-wide settings, read once at cold start.
#[derive(Debug, Clone)]
pub struct Config {
    pub table_name: String,
    pub jwt_secret: String,
    pub admin_invite_token: Option<String>,
    pub client_url: String,
    pub upload_bucket: String,
    pub public_base_url: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let or_default = |key: &str, default: &str| {
            var(key).unwrap_or_else(|| {
                info!("{key} not set, using default: {default}");
                default.to_string()
            })
        };

        let jwt_secret = var("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        let admin_invite_token = var("ADMIN_INVITE_TOKEN");
        if admin_invite_token.is_none() {
            warn!("ADMIN_INVITE_TOKEN not set, admin registration disabled");
        }

        Ok(Self {
            table_name: or_default("TABLE_NAME", DEFAULT_TABLE_NAME),
            jwt_secret,
            admin_invite_token,
            client_url: or_default("CLIENT_URL", DEFAULT_CLIENT_URL),
            upload_bucket: or_default("UPLOAD_BUCKET", DEFAULT_UPLOAD_BUCKET),
            public_base_url: var("PUBLIC_BASE_URL").map(|u| u.trim_end_matches('/').to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_fill_optional_values() {
        let config = Config::from_lookup(lookup(&[("JWT_SECRET", "s3cret")])).unwrap();
        assert_eq!(config.table_name, "taskboard");
        assert_eq!(config.client_url, "*");
        assert_eq!(config.upload_bucket, "taskboard-uploads");
        assert_eq!(config.admin_invite_token, None);
        assert_eq!(config.public_base_url, None);
    }

    #[test]
    fn missing_secret_fails() {
        assert_eq!(
            Config::from_lookup(lookup(&[])).unwrap_err(),
            ConfigError::Missing("JWT_SECRET")
        );
        assert!(Config::from_lookup(lookup(&[("JWT_SECRET", "  ")])).is_err());
    }

    #[test]
    fn explicit_values_win() {
        let config = Config::from_lookup(lookup(&[
            ("JWT_SECRET", "s3cret"),
            ("TABLE_NAME", "tasks-prod"),
            ("ADMIN_INVITE_TOKEN", "invite-me"),
            ("CLIENT_URL", "https://app.example.com"),
            ("PUBLIC_BASE_URL", "https://api.example.com/"),
        ]))
        .unwrap();
        assert_eq!(config.table_name, "tasks-prod");
        assert_eq!(config.admin_invite_token.as_deref(), Some("invite-me"));
        assert_eq!(config.client_url, "https://app.example.com");
        assert_eq!(config.public_base_url.as_deref(), Some("https://api.example.com"));
    }
}
