use aws_sdk_dynamodb::operation::transact_write_items::TransactWriteItemsError;
use aws_sdk_dynamodb::types::{AttributeValue, CancellationReason, Delete, Put, TransactWriteItem};
use aws_sdk_dynamodb::Client as DynamoClient;
use chrono::Utc;

use super::model::{email_key, NewUser, Role, User};
use crate::dynamo::{self, get_s, get_time, Item};
use crate::error::ApiError;

const USER_PK: &str = "USER";
const EMAIL_PK: &str = "EMAIL";

fn user_sk(user_id: &str) -> String {
    format!("USER#{}", user_id)
}

fn email_sk(email: &str) -> String {
    format!("EMAIL#{}", email_key(email))
}

pub fn user_to_item(user: &User) -> Item {
    let mut item = dynamo::key(USER_PK, user_sk(&user.user_id));
    item.insert("name".to_string(), AttributeValue::S(user.name.clone()));
    item.insert("email".to_string(), AttributeValue::S(user.email.clone()));
    item.insert("password_hash".to_string(), AttributeValue::S(user.password_hash.clone()));
    item.insert("role".to_string(), AttributeValue::S(user.role.as_str().to_string()));
    if let Some(url) = &user.profile_image_url {
        item.insert("profile_image_url".to_string(), AttributeValue::S(url.clone()));
    }
    item.insert("created_at".to_string(), dynamo::time(&user.created_at));
    item.insert("updated_at".to_string(), dynamo::time(&user.updated_at));
    item
}

pub fn user_from_item(item: &Item) -> Option<User> {
    let sk = get_s(item, "SK")?;
    let user_id = sk.strip_prefix("USER#")?.to_string();
    let created_at = get_time(item, "created_at").unwrap_or_else(Utc::now);

    Some(User {
        user_id,
        name: get_s(item, "name").unwrap_or_default(),
        email: get_s(item, "email").unwrap_or_default(),
        password_hash: get_s(item, "password_hash").unwrap_or_default(),
        role: get_s(item, "role")
            .and_then(|r| Role::parse(&r))
            .unwrap_or_default(),
        profile_image_url: get_s(item, "profile_image_url"),
        created_at,
        updated_at: get_time(item, "updated_at").unwrap_or(created_at),
    })
}

fn email_claim(table_name: &str, email: &str, user_id: &str) -> Result<TransactWriteItem, ApiError> {
    let mut item = dynamo::key(EMAIL_PK, email_sk(email));
    item.insert("user_id".to_string(), AttributeValue::S(user_id.to_string()));

    let put = Put::builder()
        .table_name(table_name)
        .set_item(Some(item))
        .condition_expression("attribute_not_exists(SK)")
        .build()
        .map_err(|e| ApiError::internal("Server Error", e))?;
    Ok(TransactWriteItem::builder().put(put).build())
}

fn email_release(table_name: &str, email: &str) -> Result<TransactWriteItem, ApiError> {
    let delete = Delete::builder()
        .table_name(table_name)
        .set_key(Some(dynamo::key(EMAIL_PK, email_sk(email))))
        .build()
        .map_err(|e| ApiError::internal("Server Error", e))?;
    Ok(TransactWriteItem::builder().delete(delete).build())
}

fn user_put(table_name: &str, user: &User) -> Result<TransactWriteItem, ApiError> {
    let put = Put::builder()
        .table_name(table_name)
        .set_item(Some(user_to_item(user)))
        .build()
        .map_err(|e| ApiError::internal("Server Error", e))?;
    Ok(TransactWriteItem::builder().put(put).build())
}

fn user_delete(table_name: &str, user_id: &str) -> Result<TransactWriteItem, ApiError> {
    let delete = Delete::builder()
        .table_name(table_name)
        .set_key(Some(dynamo::key(USER_PK, user_sk(user_id))))
        .build()
        .map_err(|e| ApiError::internal("Server Error", e))?;
    Ok(TransactWriteItem::builder().delete(delete).build())
}

/// Conflict only when a condition check failed.
fn conflict_from_reasons(reasons: &[CancellationReason], conflict_message: &str) -> Option<ApiError> {
    reasons
        .iter()
        .any(|r| r.code() == Some("ConditionalCheckFailed"))
        .then(|| ApiError::conflict(conflict_message))
}

async fn write_transaction(
    client: &DynamoClient,
    items: Vec<TransactWriteItem>,
    conflict_message: &str,
) -> Result<(), ApiError> {
    client
        .transact_write_items()
        .set_transact_items(Some(items))
        .send()
        .await
        .map_err(|e| {
            let conflict = match e.as_service_error() {
                Some(TransactWriteItemsError::TransactionCanceledException(tc)) => {
                    conflict_from_reasons(tc.cancellation_reasons(), conflict_message)
                }
                _ => None,
            };
            conflict.unwrap_or_else(|| ApiError::storage("transact_write_items", e))
        })?;
    Ok(())
}

/// Create a user and claim its email in one transaction.
/// A claim that already exists cancels the transaction (Conflict).
pub async fn create_user(
    client: &DynamoClient,
    table_name: &str,
    new_user: NewUser,
) -> Result<User, ApiError> {
    let now = Utc::now();
    let user = User {
        user_id: uuid::Uuid::new_v4().to_string(),
        name: new_user.name,
        email: new_user.email.trim().to_string(),
        password_hash: new_user.password_hash,
        role: new_user.role,
        profile_image_url: new_user.profile_image_url,
        created_at: now,
        updated_at: now,
    };

    write_transaction(
        client,
        vec![
            user_put(table_name, &user)?,
            email_claim(table_name, &user.email, &user.user_id)?,
        ],
        "User already exists",
    )
    .await?;

    tracing::info!("Created user {} with role {}", user.user_id, user.role.as_str());
    Ok(user)
}

pub async fn get_user(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
) -> Result<User, ApiError> {
    find_user(client, table_name, user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))
}

pub async fn find_user(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
) -> Result<Option<User>, ApiError> {
    let result = client
        .get_item()
        .table_name(table_name)
        .set_key(Some(dynamo::key(USER_PK, user_sk(user_id))))
        .send()
        .await
        .map_err(|e| ApiError::storage("get_item", e))?;

    Ok(result.item().and_then(user_from_item))
}

/// Resolve an email claim to its user, if any.
pub async fn find_user_by_email(
    client: &DynamoClient,
    table_name: &str,
    email: &str,
) -> Result<Option<User>, ApiError> {
    let result = client
        .get_item()
        .table_name(table_name)
        .set_key(Some(dynamo::key(EMAIL_PK, email_sk(email))))
        .send()
        .await
        .map_err(|e| ApiError::storage("get_item", e))?;

    match result.item().and_then(|item| get_s(item, "user_id")) {
        Some(user_id) => find_user(client, table_name, &user_id).await,
        None => Ok(None),
    }
}

pub async fn load_users(client: &DynamoClient, table_name: &str) -> Result<Vec<User>, ApiError> {
    let items = dynamo::query_partition(client, table_name, USER_PK, "USER#").await?;
    Ok(items.iter().filter_map(user_from_item).collect())
}

/// Persist a modified user. When the email changed, the old claim is
/// released and the new one claimed in the same transaction.
pub async fn save_user(
    client: &DynamoClient,
    table_name: &str,
    user: &User,
    previous_email: &str,
) -> Result<(), ApiError> {
    if email_key(previous_email) == email_key(&user.email) {
        client
            .put_item()
            .table_name(table_name)
            .set_item(Some(user_to_item(user)))
            .send()
            .await
            .map_err(|e| ApiError::storage("put_item", e))?;
        return Ok(());
    }

    write_transaction(
        client,
        vec![
            user_put(table_name, user)?,
            email_release(table_name, previous_email)?,
            email_claim(table_name, &user.email, &user.user_id)?,
        ],
        "Email already in use",
    )
    .await
}

/// Remove the user record and its email claim.
pub async fn delete_user(client: &DynamoClient, table_name: &str, user: &User) -> Result<(), ApiError> {
    write_transaction(
        client,
        vec![
            user_delete(table_name, &user.user_id)?,
            email_release(table_name, &user.email)?,
        ],
        "User changed during delete",
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> User {
        let now = Utc::now();
        User {
            user_id: "7f1c".into(),
            name: "Grace".into(),
            email: "grace@example.com".into(),
            password_hash: "$argon2id$v=19$hash".into(),
            role: Role::Member,
            profile_image_url: Some("https://cdn/uploads/1-g.png".into()),
            created_at: now,
            updated_at: now,
        }
    }

    fn reason(code: &str) -> CancellationReason {
        CancellationReason::builder().code(code).build()
    }

    #[test]
    fn taken_email_claim_is_a_conflict() {
        let reasons = vec![reason("None"), reason("ConditionalCheckFailed")];
        let err = conflict_from_reasons(&reasons, "User already exists").unwrap();
        assert_eq!(err.status_code(), lambda_http::http::StatusCode::CONFLICT);
        assert_eq!(err.to_string(), "User already exists");
    }

    #[test]
    fn other_cancellations_are_not_conflicts() {
        assert!(conflict_from_reasons(&[reason("None"), reason("TransactionConflict")], "x").is_none());
        assert!(conflict_from_reasons(&[reason("ThrottlingError")], "x").is_none());
        assert!(conflict_from_reasons(&[], "x").is_none());
    }

    #[test]
    fn user_item_round_trip_keeps_hash_and_role() {
        let user = sample();
        let item = user_to_item(&user);
        assert_eq!(get_s(&item, "PK").as_deref(), Some("USER"));
        assert_eq!(get_s(&item, "SK").as_deref(), Some("USER#7f1c"));

        let back = user_from_item(&item).unwrap();
        assert_eq!(back.user_id, "7f1c");
        assert_eq!(back.password_hash, user.password_hash);
        assert_eq!(back.role, Role::Member);
        assert_eq!(back.profile_image_url, user.profile_image_url);
    }

    #[test]
    fn items_outside_the_user_prefix_are_ignored() {
        let item = dynamo::key("EMAIL", "EMAIL#grace@example.com".to_string());
        assert!(user_from_item(&item).is_none());
    }

    #[test]
    fn unknown_roles_read_as_member() {
        let mut item = user_to_item(&sample());
        item.insert("role".to_string(), AttributeValue::S("owner".into()));
        assert_eq!(user_from_item(&item).unwrap().role, Role::Member);
    }

    #[test]
    fn email_claims_are_case_insensitive() {
        assert_eq!(email_sk("Grace@Example.com"), email_sk("grace@example.com "));
    }
}
