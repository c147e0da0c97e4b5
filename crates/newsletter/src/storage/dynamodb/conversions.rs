//! DynamoDB attribute conversion functions.
//!
//! Pure functions for converting between DynamoDB AttributeValue maps and the
//! backend-neutral attribute maps items are built from. These are testable in
//! isolation without DynamoDB access.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;

use newsletter_core::item::{AttrMap, AttrValue};
use newsletter_core::storage::{Result, StoreError};

/// Convert a neutral attribute map to a DynamoDB item.
pub fn to_dynamo_item(attrs: &AttrMap) -> HashMap<String, AttributeValue> {
    attrs
        .iter()
        .map(|(name, value)| (name.clone(), to_attribute_value(value)))
        .collect()
}

/// Convert a DynamoDB item to a neutral attribute map.
pub fn from_dynamo_item(item: &HashMap<String, AttributeValue>) -> Result<AttrMap> {
    item.iter()
        .map(|(name, value)| Ok((name.clone(), from_attribute_value(name, value)?)))
        .collect()
}

/// Convert a single neutral value to a DynamoDB attribute value.
pub fn to_attribute_value(value: &AttrValue) -> AttributeValue {
    match value {
        AttrValue::S(value) => AttributeValue::S(value.clone()),
        AttrValue::N(value) => AttributeValue::N(value.to_string()),
        AttrValue::Bool(value) => AttributeValue::Bool(*value),
    }
}

fn from_attribute_value(name: &str, value: &AttributeValue) -> Result<AttrValue> {
    match value {
        AttributeValue::S(value) => Ok(AttrValue::S(value.clone())),
        AttributeValue::Bool(value) => Ok(AttrValue::Bool(*value)),
        AttributeValue::N(value) => value.parse().map(AttrValue::N).map_err(|err| {
            StoreError::InvalidData(format!("Invalid number in attribute {name}: {err}"))
        }),
        other => Err(StoreError::InvalidData(format!(
            "Unsupported attribute type for {name}: {other:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use newsletter_core::item::item_row;
    use newsletter_core::item::FromAttributes;
    use newsletter_core::subscription::Subscription;

    #[test]
    fn test_round_trips_all_value_kinds() {
        let mut attrs = AttrMap::new();
        attrs.insert("name".to_string(), AttrValue::S("reader".to_string()));
        attrs.insert("count".to_string(), AttrValue::N(-3));
        attrs.insert("isConfirmed".to_string(), AttrValue::Bool(true));

        let item = to_dynamo_item(&attrs);
        let restored = from_dynamo_item(&item).unwrap();

        assert_eq!(restored, attrs);
    }

    #[test]
    fn test_numbers_become_number_attributes() {
        let mut attrs = AttrMap::new();
        attrs.insert("count".to_string(), AttrValue::N(42));

        let item = to_dynamo_item(&attrs);

        assert_eq!(item.get("count"), Some(&AttributeValue::N("42".to_string())));
    }

    #[test]
    fn test_rejects_unparseable_number() {
        let mut item = HashMap::new();
        item.insert(
            "count".to_string(),
            AttributeValue::N("not-a-number".to_string()),
        );

        let result = from_dynamo_item(&item);

        assert!(matches!(result, Err(StoreError::InvalidData(_))));
    }

    #[test]
    fn test_rejects_unsupported_attribute_type() {
        let mut item = HashMap::new();
        item.insert(
            "tags".to_string(),
            AttributeValue::Ss(vec!["a".to_string(), "b".to_string()]),
        );

        let result = from_dynamo_item(&item);

        assert!(matches!(result, Err(StoreError::InvalidData(_))));
    }

    #[test]
    fn test_subscription_row_survives_conversion() {
        let subscription = Subscription::new("reader@example.com");

        let item = to_dynamo_item(&item_row(&subscription));
        let attrs = from_dynamo_item(&item).unwrap();
        let restored = Subscription::from_attributes(&attrs).unwrap();

        assert_eq!(restored, subscription);
    }
}
