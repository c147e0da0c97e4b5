//! Seed command implementation.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;

use newsletter_core::item::{
    item_row, AttrMap, AttrValue, ItemType, ATTR_COUNT, ATTR_PARTITION_KEY, ATTR_SORT_KEY,
};
use newsletter_core::storage::counter_key;
use newsletter_core::subscription::Subscription;

use super::error::{DynamodbError, Result};

/// Generate mock subscriptions with a mix of confirmed and pending readers.
pub fn generate_seed_subscriptions(count: u32) -> Vec<Subscription> {
    let names = [
        "astrid", "bruno", "carla", "diego", "elena", "felix", "greta", "hugo", "iris", "jonas",
    ];
    let domains = ["example.com", "example.org", "example.net"];

    let mut subscriptions = Vec::with_capacity(count as usize);

    for i in 0..count as usize {
        let name = names[i % names.len()];
        let domain = domains[i % domains.len()];
        let email_address = if i < names.len() {
            format!("{name}@{domain}")
        } else {
            format!("{name}{}@{domain}", i / names.len())
        };

        let mut subscription = Subscription::new(email_address);
        // Roughly two thirds of seeded readers have confirmed
        subscription.is_confirmed = i % 3 != 0;
        subscriptions.push(subscription);
    }

    subscriptions
}

/// Convert a stored row to DynamoDB attribute values.
fn to_dynamo_item(row: &AttrMap) -> HashMap<String, AttributeValue> {
    row.iter()
        .map(|(name, value)| {
            let converted = match value {
                AttrValue::S(s) => AttributeValue::S(s.clone()),
                AttrValue::N(n) => AttributeValue::N(n.to_string()),
                AttrValue::Bool(b) => AttributeValue::Bool(*b),
            };
            (name.clone(), converted)
        })
        .collect()
}

/// Insert subscriptions into DynamoDB and settle the subscription counter.
pub async fn seed_subscriptions(
    client: &Client,
    table_name: &str,
    subscriptions: &[Subscription],
) -> Result<u32> {
    let mut inserted = 0;

    // Use batch write for efficiency (25 items per batch max)
    for chunk in subscriptions.chunks(25) {
        let write_requests: Vec<_> = chunk
            .iter()
            .map(|subscription| {
                let item = to_dynamo_item(&item_row(subscription));
                aws_sdk_dynamodb::types::WriteRequest::builder()
                    .put_request(
                        aws_sdk_dynamodb::types::PutRequest::builder()
                            .set_item(Some(item))
                            .build()
                            .expect("Failed to build PutRequest"),
                    )
                    .build()
            })
            .collect();

        client
            .batch_write_item()
            .request_items(table_name, write_requests)
            .send()
            .await
            .map_err(|e| DynamodbError::AwsSdk(e.to_string()))?;

        inserted += chunk.len() as u32;
    }

    // Batch writes bypass the transactional counter updates, so the counter
    // is settled with a single ADD once all rows are in.
    let (partition_key, sort_key) = counter_key(ItemType::Subscription);
    client
        .update_item()
        .table_name(table_name)
        .key(ATTR_PARTITION_KEY, AttributeValue::S(partition_key))
        .key(ATTR_SORT_KEY, AttributeValue::S(sort_key))
        .update_expression("ADD #count :count")
        .expression_attribute_names("#count", ATTR_COUNT)
        .expression_attribute_values(":count", AttributeValue::N(inserted.to_string()))
        .send()
        .await
        .map_err(|e| DynamodbError::AwsSdk(e.to_string()))?;

    Ok(inserted)
}
