//! DynamoDB store implementation.
//!
//! Implements the `ItemStore` trait from `newsletter_core::storage` using a
//! single DynamoDB table. Creates and deletes run as `TransactWriteItems`
//! calls that pair the item write with an additive update of the matching
//! counter row, so the item and its counter commit together or not at all.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::{AttributeValue, Delete, Put, TransactWriteItem, Update};
use aws_sdk_dynamodb::Client;

use newsletter_core::item::{
    item_row, AttrMap, AttrValue, Item, ItemType, ATTR_COUNT, ATTR_PARTITION_KEY, ATTR_SORT_KEY,
    INDEX_ITEM_TYPE,
};
use newsletter_core::storage::{ItemStore, Result, StoreError};

use super::conversions::{from_dynamo_item, to_attribute_value, to_dynamo_item};
use super::error::{
    map_create_error, map_delete_error, map_get_item_error, map_query_error,
    map_update_item_error,
};

/// DynamoDB-based store implementation.
pub struct DynamoDbStore {
    client: Client,
    table_name: String,
}

impl DynamoDbStore {
    /// Creates a new store with the given DynamoDB client and table name.
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    /// The transaction entry that adds `delta` to an item's counter row.
    ///
    /// `ADD` treats a missing counter as zero, so the first create brings the
    /// counter row into existence.
    fn counter_update(&self, item: &dyn Item, delta: i64) -> Result<TransactWriteItem> {
        let update = Update::builder()
            .table_name(&self.table_name)
            .key(
                ATTR_PARTITION_KEY,
                AttributeValue::S(item.counter_partition_key()),
            )
            .key(ATTR_SORT_KEY, AttributeValue::S(item.counter_sort_key()))
            .update_expression("ADD #count :count")
            .expression_attribute_names("#count", ATTR_COUNT)
            .expression_attribute_values(":count", AttributeValue::N(delta.to_string()))
            .build()
            .map_err(|err| StoreError::Transaction(err.to_string()))?;

        Ok(TransactWriteItem::builder().update(update).build())
    }
}

/// Render a SET expression with positional placeholders from assignments.
fn render_set_expression(
    assignments: &[(String, AttrValue)],
) -> (String, HashMap<String, String>, HashMap<String, AttributeValue>) {
    let mut clauses = Vec::with_capacity(assignments.len());
    let mut names = HashMap::new();
    let mut values = HashMap::new();

    for (position, (name, value)) in assignments.iter().enumerate() {
        clauses.push(format!("#n{position} = :v{position}"));
        names.insert(format!("#n{position}"), name.clone());
        values.insert(format!(":v{position}"), to_attribute_value(value));
    }

    (format!("SET {}", clauses.join(", ")), names, values)
}

#[async_trait]
impl ItemStore for DynamoDbStore {
    async fn put_item(&self, item: &dyn Item) -> Result<()> {
        item.validate()?;

        let put = Put::builder()
            .table_name(&self.table_name)
            .set_item(Some(to_dynamo_item(&item_row(item))))
            .condition_expression("attribute_not_exists(pk)")
            .build()
            .map_err(|err| StoreError::Transaction(err.to_string()))?;

        self.client
            .transact_write_items()
            .transact_items(TransactWriteItem::builder().put(put).build())
            .transact_items(self.counter_update(item, 1)?)
            .send()
            .await
            .map_err(|err| map_create_error(err, item.item_type(), item.partition_key()))?;

        Ok(())
    }

    async fn delete_item(&self, item: &dyn Item) -> Result<()> {
        let delete = Delete::builder()
            .table_name(&self.table_name)
            .key(ATTR_PARTITION_KEY, AttributeValue::S(item.partition_key()))
            .key(ATTR_SORT_KEY, AttributeValue::S(item.sort_key()))
            .condition_expression("attribute_exists(pk)")
            .build()
            .map_err(|err| StoreError::Transaction(err.to_string()))?;

        self.client
            .transact_write_items()
            .transact_items(TransactWriteItem::builder().delete(delete).build())
            .transact_items(self.counter_update(item, -1)?)
            .send()
            .await
            .map_err(|err| map_delete_error(err, item.item_type(), item.partition_key()))?;

        Ok(())
    }

    async fn get_item(
        &self,
        partition_key: &str,
        sort_key: Option<&str>,
    ) -> Result<Option<AttrMap>> {
        match sort_key {
            Some(sort_key) => {
                let result = self
                    .client
                    .get_item()
                    .table_name(&self.table_name)
                    .key(
                        ATTR_PARTITION_KEY,
                        AttributeValue::S(partition_key.to_string()),
                    )
                    .key(ATTR_SORT_KEY, AttributeValue::S(sort_key.to_string()))
                    .send()
                    .await
                    .map_err(map_get_item_error)?;

                match result.item {
                    Some(item) => Ok(Some(from_dynamo_item(&item)?)),
                    None => Ok(None),
                }
            }
            None => {
                let result = self
                    .client
                    .query()
                    .table_name(&self.table_name)
                    .key_condition_expression("pk = :pk")
                    .expression_attribute_values(
                        ":pk",
                        AttributeValue::S(partition_key.to_string()),
                    )
                    .limit(1)
                    .send()
                    .await
                    .map_err(map_query_error)?;

                match result.items.unwrap_or_default().into_iter().next() {
                    Some(item) => Ok(Some(from_dynamo_item(&item)?)),
                    None => Ok(None),
                }
            }
        }
    }

    async fn query_type(&self, item_type: ItemType) -> Result<Vec<AttrMap>> {
        let mut rows = Vec::new();
        let mut exclusive_start_key = None;

        loop {
            let result = self
                .client
                .query()
                .table_name(&self.table_name)
                .index_name(INDEX_ITEM_TYPE)
                .key_condition_expression("itemType = :itemType")
                .expression_attribute_values(
                    ":itemType",
                    AttributeValue::S(item_type.to_string()),
                )
                .set_exclusive_start_key(exclusive_start_key)
                .send()
                .await
                .map_err(map_query_error)?;

            for item in result.items.unwrap_or_default() {
                rows.push(from_dynamo_item(&item)?);
            }

            exclusive_start_key = result.last_evaluated_key;
            if exclusive_start_key.is_none() {
                break;
            }
        }

        Ok(rows)
    }

    async fn update_item(&self, item: &dyn Item) -> Result<()> {
        item.validate()?;

        let update = item.update_expression();
        if update.is_empty() {
            return Err(StoreError::InvalidData(
                "Update expression has no assignments".to_string(),
            ));
        }
        let (expression, names, values) = render_set_expression(update.assignments());

        self.client
            .update_item()
            .table_name(&self.table_name)
            .key(ATTR_PARTITION_KEY, AttributeValue::S(item.partition_key()))
            .key(ATTR_SORT_KEY, AttributeValue::S(item.sort_key()))
            .update_expression(expression)
            .set_expression_attribute_names(Some(names))
            .set_expression_attribute_values(Some(values))
            .condition_expression("attribute_exists(pk)")
            .send()
            .await
            .map_err(|err| map_update_item_error(err, item.item_type(), item.partition_key()))?;

        Ok(())
    }
}
