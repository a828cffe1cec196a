use lambda_http::http::StatusCode;
use serde::Serialize;
use thiserror::Error;

/// Every failure a handler can surface to the client.
///
/// Rendered as `{"message": .., "error": ..}`; `error` is only filled for
/// internal failures so clients can show the detail in a notification.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{message}")]
    Internal { message: String, detail: String },
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn internal(message: impl Into<String>, detail: impl std::fmt::Display) -> Self {
        Self::Internal {
            message: message.into(),
            detail: detail.to_string(),
        }
    }

    /// Wraps an AWS SDK failure, keeping the full error chain as detail.
    pub fn storage<E>(operation: &str, err: E) -> Self
    where
        E: std::error::Error,
    {
        let detail = aws_sdk_dynamodb::error::DisplayErrorContext(&err).to_string();
        tracing::error!("{} failed: {}", operation, detail);
        Self::Internal {
            message: "Server Error".to_string(),
            detail,
        }
    }

    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn body(&self) -> ErrorBody {
        match self {
            Self::Internal { message, detail } => ErrorBody {
                message: message.clone(),
                error: Some(detail.clone()),
            },
            other => ErrorBody {
                message: other.to_string(),
                error: None,
            },
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::BadRequest(format!("Invalid request body: {}", err))
    }
}

impl From<lambda_http::http::Error> for ApiError {
    fn from(err: lambda_http::http::Error) -> Self {
        Self::internal("Failed to build response", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(ApiError::bad_request("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::unauthorized("x").status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::forbidden("x").status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::not_found("x").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::conflict("x").status_code(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::internal("Server Error", "boom").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn only_internal_errors_carry_detail() {
        let body = serde_json::to_value(ApiError::not_found("Task not found").body()).unwrap();
        assert_eq!(body, serde_json::json!({"message": "Task not found"}));

        let body = serde_json::to_value(ApiError::internal("Server Error", "disk on fire").body()).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"message": "Server Error", "error": "disk on fire"})
        );
    }

    #[test]
    fn malformed_json_is_a_bad_request() {
        let err: ApiError = serde_json::from_str::<serde_json::Value>("{nope").unwrap_err().into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().starts_with("Invalid request body"));
    }
}
