//! HS256 bearer tokens carrying `{id, iat, exp}`. Tokens live for seven days.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use taskboard_atoms::ApiError;

pub const TOKEN_LIFETIME_DAYS: i64 = 7;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    pub id: String,
    pub iat: i64,
    pub exp: i64,
}

pub fn issue_token(user_id: &str, secret: &str, now: DateTime<Utc>) -> Result<String, ApiError> {
    let claims = Claims {
        id: user_id.to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::days(TOKEN_LIFETIME_DAYS)).timestamp(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::internal("Server Error", e))
}

/// Checks signature, algorithm and expiry against the system clock.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, ApiError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => ApiError::unauthorized("Not authorized, token expired"),
            _ => ApiError::unauthorized("Not authorized, token failed"),
        })
}
