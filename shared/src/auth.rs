use aws_sdk_dynamodb::Client as DynamoClient;
use chrono::Utc;
use lambda_http::http::{HeaderMap, StatusCode};
use serde::{Deserialize, Serialize};
use taskboard_atoms::http::{json_response, parse_body, HandlerResult};
use taskboard_atoms::users::{self, NewUser, Role, User};
use taskboard_atoms::{ApiError, Caller};

use crate::config::Config;
use crate::password::{hash_password, verify_against_dummy, verify_password};
use crate::token::{issue_token, verify_token};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPayload {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub profile_image_url: Option<String>,
    pub admin_invite_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginPayload {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfilePayload {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub profile_image_url: Option<String>,
}

/// User fields plus a bearer token, returned by register, login and profile update.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    #[serde(rename = "_id")]
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub profile_image_url: Option<String>,
    pub token: String,
}

impl AuthResponse {
    fn new(user: User, token: String) -> Self {
        Self {
            user_id: user.user_id,
            name: user.name,
            email: user.email,
            role: user.role,
            profile_image_url: user.profile_image_url,
            token,
        }
    }
}

fn filled(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Admin only when an invite token is configured and matches exactly.
pub fn resolve_role(configured: Option<&str>, supplied: Option<&str>) -> Role {
    match (configured, supplied) {
        (Some(expected), Some(given)) if expected == given => Role::Admin,
        _ => Role::Member,
    }
}

/// Apply a partial profile update. Empty strings count as omitted.
/// Returns the previous email so the caller can move the uniqueness claim.
pub fn apply_profile_update(
    user: &mut User,
    payload: UpdateProfilePayload,
) -> Result<String, ApiError> {
    let previous_email = user.email.clone();
    if let Some(name) = filled(payload.name) {
        user.name = name;
    }
    if let Some(email) = filled(payload.email) {
        user.email = email;
    }
    if let Some(url) = filled(payload.profile_image_url) {
        user.profile_image_url = Some(url);
    }
    if let Some(password) = payload.password.filter(|p| !p.is_empty()) {
        user.password_hash = hash_password(&password)?;
    }
    user.updated_at = Utc::now();
    Ok(previous_email)
}

/// Same Unauthorized error, after the same hashing work, whether the email
/// is unknown or the password is wrong.
pub fn check_credentials(found: Option<&User>, password: &str) -> Result<(), ApiError> {
    let matched = match found {
        Some(user) => verify_password(password, &user.password_hash),
        None => {
            verify_against_dummy(password);
            false
        }
    };
    if matched {
        Ok(())
    } else {
        Err(ApiError::unauthorized(INVALID_CREDENTIALS))
    }
}

/// POST /api/auth/register
pub async fn register(client: &DynamoClient, config: &Config, body: &[u8]) -> HandlerResult {
    let payload: RegisterPayload = parse_body(body)?;
    let (Some(name), Some(email), Some(password)) = (
        filled(payload.name),
        filled(payload.email),
        payload.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(ApiError::bad_request("Name, email and password are required"));
    };

    let role = resolve_role(
        config.admin_invite_token.as_deref(),
        payload.admin_invite_token.as_deref(),
    );
    let user = users::create_user(
        client,
        &config.table_name,
        NewUser {
            name,
            email,
            password_hash: hash_password(&password)?,
            role,
            profile_image_url: filled(payload.profile_image_url),
        },
    )
    .await?;

    let token = issue_token(&user.user_id, &config.jwt_secret, Utc::now())?;
    json_response(StatusCode::CREATED, &AuthResponse::new(user, token))
}

/// POST /api/auth/login
pub async fn login(client: &DynamoClient, config: &Config, body: &[u8]) -> HandlerResult {
    let payload: LoginPayload = parse_body(body)?;
    let (Some(email), Some(password)) = (filled(payload.email), payload.password) else {
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    };

    let found = users::find_user_by_email(client, &config.table_name, &email).await?;
    if let Err(e) = check_credentials(found.as_ref(), &password) {
        tracing::warn!("Failed login attempt");
        return Err(e);
    }
    let Some(user) = found else {
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    };

    let token = issue_token(&user.user_id, &config.jwt_secret, Utc::now())?;
    json_response(StatusCode::OK, &AuthResponse::new(user, token))
}

/// GET /api/auth/profile
pub async fn get_profile(client: &DynamoClient, table_name: &str, caller: &Caller) -> HandlerResult {
    let user = users::get_user(client, table_name, &caller.user_id).await?;
    json_response(StatusCode::OK, &user)
}

/// PUT /api/auth/profile
pub async fn update_profile(client: &DynamoClient, config: &Config, caller: &Caller, body: &[u8]) -> HandlerResult {
    let payload: UpdateProfilePayload = parse_body(body)?;
    let mut user = users::get_user(client, &config.table_name, &caller.user_id).await?;

    let previous_email = apply_profile_update(&mut user, payload)?;
    users::save_user(client, &config.table_name, &user, &previous_email).await?;

    let token = issue_token(&user.user_id, &config.jwt_secret, Utc::now())?;
    json_response(StatusCode::OK, &AuthResponse::new(user, token))
}

/// Pull the token out of `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Verify the bearer token and load its user.
pub async fn authenticate_request(
    client: &DynamoClient,
    config: &Config,
    headers: &HeaderMap,
) -> Result<Caller, ApiError> {
    let token = bearer_token(headers).ok_or_else(|| ApiError::unauthorized("Not authorized, no token"))?;
    let claims = verify_token(token, &config.jwt_secret).map_err(|e| {
        tracing::warn!("Rejected bearer token: {}", e);
        e
    })?;

    match users::find_user(client, &config.table_name, &claims.id).await? {
        Some(user) => Ok(Caller::from(&user)),
        None => Err(ApiError::unauthorized("Not authorized, user not found")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lambda_http::http::HeaderValue;

    fn user() -> User {
        let now = Utc::now();
        User {
            user_id: "u1".into(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password_hash: hash_password("old-password").unwrap(),
            role: Role::Member,
            profile_image_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn invite_token_must_match_exactly() {
        assert_eq!(resolve_role(Some("invite"), Some("invite")), Role::Admin);
        assert_eq!(resolve_role(Some("invite"), Some("Invite")), Role::Member);
        assert_eq!(resolve_role(Some("invite"), None), Role::Member);
        assert_eq!(resolve_role(None, Some("invite")), Role::Member);
    }

    #[test]
    fn profile_update_is_partial() {
        let mut u = user();
        let old_hash = u.password_hash.clone();
        let previous = apply_profile_update(
            &mut u,
            UpdateProfilePayload { name: Some("Ada L".into()), email: Some("".into()), ..Default::default() },
        )
        .unwrap();
        assert_eq!(previous, "ada@example.com");
        assert_eq!(u.name, "Ada L");
        assert_eq!(u.email, "ada@example.com");
        assert_eq!(u.password_hash, old_hash);
    }

    #[test]
    fn profile_update_rehashes_password() {
        let mut u = user();
        apply_profile_update(
            &mut u,
            UpdateProfilePayload { password: Some("new-password".into()), ..Default::default() },
        )
        .unwrap();
        assert!(verify_password("new-password", &u.password_hash));
        assert!(!verify_password("old-password", &u.password_hash));
    }

    #[test]
    fn unknown_email_and_wrong_password_look_the_same() {
        let known = user();
        let missing = check_credentials(None, "old-password").unwrap_err();
        let wrong = check_credentials(Some(&known), "not-it").unwrap_err();

        assert_eq!(missing.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(wrong.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            serde_json::to_value(missing.body()).unwrap(),
            serde_json::to_value(wrong.body()).unwrap()
        );
        assert!(check_credentials(Some(&known), "old-password").is_ok());
    }

    #[test]
    fn bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);
        headers.insert("Authorization", HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);
        headers.insert("Authorization", HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));
    }

    #[test]
    fn auth_response_never_leaks_the_hash() {
        let json = serde_json::to_value(AuthResponse::new(user(), "tok".into())).unwrap();
        assert_eq!(json["_id"], "u1");
        assert_eq!(json["role"], "member");
        assert_eq!(json["token"], "tok");
        assert!(!json.to_string().contains("argon2"));
    }
}
