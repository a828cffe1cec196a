use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Named grouping of tasks. Tasks refer to projects by name only.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(rename = "_id")]
    pub project_id: String,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateProjectPayload {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Case-insensitive uniqueness key for a project name.
pub fn project_key(name: &str) -> String {
    name.trim().to_lowercase()
}
