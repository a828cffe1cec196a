//! Small helpers shared by every atom that reads or writes the single table.
//!
//! All entities live under a fixed partition (`USER`, `TASK`, `EMAIL`,
//! `PROJECT`) with `SK = {KIND}#{id}`.

use aws_sdk_dynamodb::types::{AttributeValue, DeleteRequest, WriteRequest};
use aws_sdk_dynamodb::Client as DynamoClient;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::time::{sleep, Duration};

use crate::error::ApiError;

pub type Item = HashMap<String, AttributeValue>;

pub fn key(pk: &str, sk: String) -> Item {
    let mut key = HashMap::new();
    key.insert("PK".to_string(), AttributeValue::S(pk.to_string()));
    key.insert("SK".to_string(), AttributeValue::S(sk));
    key
}

pub fn get_s(item: &Item, name: &str) -> Option<String> {
    item.get(name).and_then(|v| v.as_s().ok()).map(|s| s.to_string())
}

pub fn get_bool(item: &Item, name: &str) -> Option<bool> {
    item.get(name).and_then(|v| v.as_bool().ok()).copied()
}

pub fn get_n<T: std::str::FromStr>(item: &Item, name: &str) -> Option<T> {
    item.get(name)
        .and_then(|v| v.as_n().ok())
        .and_then(|n| n.parse().ok())
}

pub fn get_time(item: &Item, name: &str) -> Option<DateTime<Utc>> {
    get_s(item, name)
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|t| t.with_timezone(&Utc))
}

pub fn get_string_list(item: &Item, name: &str) -> Vec<String> {
    item.get(name)
        .and_then(|v| v.as_l().ok())
        .map(|list| {
            list.iter()
                .filter_map(|v| v.as_s().ok().map(|s| s.to_string()))
                .collect()
        })
        .unwrap_or_default()
}

pub fn string_list(values: &[String]) -> AttributeValue {
    AttributeValue::L(values.iter().cloned().map(AttributeValue::S).collect())
}

pub fn time(t: &DateTime<Utc>) -> AttributeValue {
    AttributeValue::S(t.to_rfc3339())
}

/// Query every item under `pk` whose sort key starts with `sk_prefix`,
/// following `LastEvaluatedKey` until the partition is exhausted.
pub async fn query_partition(
    client: &DynamoClient,
    table_name: &str,
    pk: &str,
    sk_prefix: &str,
) -> Result<Vec<Item>, ApiError> {
    let mut items = Vec::new();
    let mut start_key: Option<Item> = None;

    loop {
        let result = client
            .query()
            .table_name(table_name)
            .key_condition_expression("PK = :pk AND begins_with(SK, :sk_prefix)")
            .expression_attribute_values(":pk", AttributeValue::S(pk.to_string()))
            .expression_attribute_values(":sk_prefix", AttributeValue::S(sk_prefix.to_string()))
            .set_exclusive_start_key(start_key.take())
            .send()
            .await
            .map_err(|e| ApiError::storage("query", e))?;

        items.extend(result.items().iter().cloned());

        match result.last_evaluated_key() {
            Some(last) if !last.is_empty() => start_key = Some(last.clone()),
            _ => break,
        }
    }

    Ok(items)
}

const BATCH_WRITE_ATTEMPTS: u64 = 5;

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum BatchStep {
    Done,
    Retry(Duration),
    GiveUp,
}

/// What to do after the `attempts`-th batch write of a chunk.
pub(crate) fn next_batch_step(attempts: u64, unprocessed: usize) -> BatchStep {
    if unprocessed == 0 {
        BatchStep::Done
    } else if attempts < BATCH_WRITE_ATTEMPTS {
        BatchStep::Retry(Duration::from_millis(100 * attempts))
    } else {
        BatchStep::GiveUp
    }
}

/// Batch delete items, 25 keys per request. Unprocessed keys are retried
/// with backoff; any still left after the last attempt fail the call.
pub async fn batch_delete(
    client: &DynamoClient,
    table_name: &str,
    delete_keys: &[Item],
) -> Result<(), ApiError> {
    for chunk in delete_keys.chunks(25) {
        let mut write_reqs = Vec::with_capacity(chunk.len());
        for k in chunk {
            let delete = DeleteRequest::builder()
                .set_key(Some(k.clone()))
                .build()
                .map_err(|e| ApiError::internal("Server Error", e))?;
            write_reqs.push(WriteRequest::builder().delete_request(delete).build());
        }

        let mut attempts = 0;
        loop {
            attempts += 1;
            let result = client
                .batch_write_item()
                .request_items(table_name, write_reqs)
                .send()
                .await
                .map_err(|e| ApiError::storage("batch_write_item", e))?;

            write_reqs = result
                .unprocessed_items()
                .and_then(|m| m.get(table_name))
                .cloned()
                .unwrap_or_default();

            match next_batch_step(attempts, write_reqs.len()) {
                BatchStep::Done => break,
                BatchStep::Retry(delay) => sleep(delay).await,
                BatchStep::GiveUp => {
                    tracing::error!(
                        "batch delete left {} keys unprocessed after {} attempts",
                        write_reqs.len(),
                        attempts
                    );
                    return Err(ApiError::internal(
                        "Server Error",
                        format!("{} keys unprocessed after {} attempts", write_reqs.len(), attempts),
                    ));
                }
            }
        }
    }

    Ok(())
}
