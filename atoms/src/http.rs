use lambda_http::{http::StatusCode, Body, Response};
use serde::Serialize;

use crate::error::ApiError;

pub type HandlerResult = Result<Response<Body>, ApiError>;

/// JSON response with the given status.
pub fn json_response<T: Serialize>(status: StatusCode, value: &T) -> HandlerResult {
    Ok(Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(serde_json::to_string(value).map_err(|e| ApiError::internal("Server Error", e))?.into())?)
}

/// `{"message": ..}` response, used by deletes and other bodiless successes.
pub fn message_response(status: StatusCode, message: &str) -> HandlerResult {
    json_response(status, &serde_json::json!({ "message": message }))
}

/// Render an error into its JSON response.
pub fn error_response(err: &ApiError) -> Response<Body> {
    let body = serde_json::to_string(&err.body()).unwrap_or_else(|_| "{\"message\":\"Server Error\"}".to_string());
    let mut resp = Response::new(Body::from(body));
    *resp.status_mut() = err.status_code();
    resp.headers_mut().insert(
        "Content-Type",
        lambda_http::http::HeaderValue::from_static("application/json"),
    );
    resp
}

/// Parse a JSON request body; an empty body parses as `{}`.
pub fn parse_body<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    if body.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(serde_json::from_slice(b"{}")?);
    }
    Ok(serde_json::from_slice(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Payload {
        name: Option<String>,
    }

    #[test]
    fn empty_body_is_an_empty_object() {
        let p: Payload = parse_body(b"").unwrap();
        assert!(p.name.is_none());
        let p: Payload = parse_body(br#"{"name":"x"}"#).unwrap();
        assert_eq!(p.name.as_deref(), Some("x"));
    }

    #[test]
    fn error_response_carries_status_and_json() {
        let resp = error_response(&ApiError::forbidden("not assigned to this task"));
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        let body: serde_json::Value = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(body["message"], "not assigned to this task");
    }
}
