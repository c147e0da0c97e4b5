//! The subscription entity and its typed store operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::item::{
    get_bool, get_datetime, get_string, get_uuid, AttrMap, AttrValue, FromAttributes, Item,
    ItemType, Update,
};
use crate::storage::{fetch_count, ItemStore, Result, ValidationError};

/// A newsletter subscription.
///
/// Stored under `pk = "SUBSCRIPTION#<emailAddress>"` and
/// `sk = "SUBSCRIPTION#<id>"`, so an email address owns its partition and a
/// subscription can be found by email alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: Uuid,
    pub email_address: String,
    pub is_confirmed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    /// Builds a new unconfirmed subscription with a fresh ID.
    pub fn new(email_address: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email_address: email_address.into(),
            is_confirmed: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Builds a subscription carrying only its identity. Deletes need nothing
    /// but the keys.
    pub fn with_key(email_address: impl Into<String>, id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id,
            email_address: email_address.into(),
            is_confirmed: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// The partition key owned by an email address.
pub fn partition_key_for(email_address: &str) -> String {
    format!("{}#{}", ItemType::Subscription, email_address)
}

/// The email address embedded in a subscription partition key.
pub fn email_from_partition_key(partition_key: &str) -> Option<&str> {
    partition_key.strip_prefix(&format!("{}#", ItemType::Subscription))
}

impl Item for Subscription {
    fn item_type(&self) -> ItemType {
        ItemType::Subscription
    }

    fn partition_key(&self) -> String {
        partition_key_for(&self.email_address)
    }

    fn sort_key(&self) -> String {
        format!("{}#{}", ItemType::Subscription, self.id)
    }

    fn attributes(&self) -> AttrMap {
        let mut attrs = AttrMap::new();
        attrs.insert("id".to_string(), AttrValue::S(self.id.to_string()));
        attrs.insert(
            "emailAddress".to_string(),
            AttrValue::S(self.email_address.clone()),
        );
        attrs.insert(
            "isConfirmed".to_string(),
            AttrValue::Bool(self.is_confirmed),
        );
        attrs.insert(
            "createdAt".to_string(),
            AttrValue::S(self.created_at.to_rfc3339()),
        );
        attrs.insert(
            "updatedAt".to_string(),
            AttrValue::S(self.updated_at.to_rfc3339()),
        );
        attrs
    }

    fn update_expression(&self) -> Update {
        Update::new().set("isConfirmed", AttrValue::Bool(self.is_confirmed))
    }

    fn validate(&self) -> std::result::Result<(), ValidationError> {
        if self.email_address.is_empty() {
            return Err(ValidationError::new(
                ItemType::Subscription,
                "email address cannot be empty",
            ));
        }

        Ok(())
    }
}

impl FromAttributes for Subscription {
    fn from_attributes(attrs: &AttrMap) -> Result<Self> {
        Ok(Self {
            id: get_uuid(attrs, "id")?,
            email_address: get_string(attrs, "emailAddress")?,
            is_confirmed: get_bool(attrs, "isConfirmed")?,
            created_at: get_datetime(attrs, "createdAt")?,
            updated_at: get_datetime(attrs, "updatedAt")?,
        })
    }
}

/// Creates a new unconfirmed subscription for an email address.
pub async fn create(store: &dyn ItemStore, email_address: &str) -> Result<Subscription> {
    let subscription = Subscription::new(email_address);
    store.put_item(&subscription).await?;
    Ok(subscription)
}

/// Finds the subscription for an email address, if any.
pub async fn find(store: &dyn ItemStore, email_address: &str) -> Result<Option<Subscription>> {
    match store
        .get_item(&partition_key_for(email_address), None)
        .await?
    {
        Some(attrs) => Ok(Some(Subscription::from_attributes(&attrs)?)),
        None => Ok(None),
    }
}

/// Lists every stored subscription.
pub async fn list(store: &dyn ItemStore) -> Result<Vec<Subscription>> {
    store
        .query_type(ItemType::Subscription)
        .await?
        .iter()
        .map(Subscription::from_attributes)
        .collect()
}

/// Marks a subscription confirmed.
pub async fn confirm(store: &dyn ItemStore, subscription: &mut Subscription) -> Result<()> {
    subscription.is_confirmed = true;
    store.update_item(subscription).await
}

/// Deletes a subscription by its identity.
pub async fn remove(store: &dyn ItemStore, email_address: &str, id: Uuid) -> Result<()> {
    store
        .delete_item(&Subscription::with_key(email_address, id))
        .await
}

/// The live number of subscriptions, read from the denormalized counter.
pub async fn count(store: &dyn ItemStore) -> Result<i64> {
    fetch_count(store, ItemType::Subscription).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::item_row;

    #[test]
    fn test_partition_key_derives_from_email() {
        assert_eq!(
            partition_key_for("reader@example.com"),
            "SUBSCRIPTION#reader@example.com"
        );
    }

    #[test]
    fn test_email_recovered_from_partition_key() {
        assert_eq!(
            email_from_partition_key("SUBSCRIPTION#reader@example.com"),
            Some("reader@example.com")
        );
        assert_eq!(email_from_partition_key("COUNT"), None);
    }

    #[test]
    fn test_sort_key_derives_from_id() {
        let mut subscription = Subscription::new("reader@example.com");
        subscription.id = Uuid::nil();

        assert_eq!(
            subscription.sort_key(),
            "SUBSCRIPTION#00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn test_new_subscription_starts_unconfirmed() {
        let subscription = Subscription::new("reader@example.com");

        assert!(!subscription.is_confirmed);
        assert_eq!(subscription.created_at, subscription.updated_at);
    }

    #[test]
    fn test_validate_rejects_empty_email() {
        let subscription = Subscription::new("");

        let error = subscription.validate().unwrap_err();
        assert_eq!(error.item_type, ItemType::Subscription);
        assert_eq!(error.message, "email address cannot be empty");
    }

    #[test]
    fn test_validate_accepts_populated_subscription() {
        assert!(Subscription::new("reader@example.com").validate().is_ok());
    }

    #[test]
    fn test_update_expression_only_touches_confirmation() {
        let mut subscription = Subscription::new("reader@example.com");
        subscription.is_confirmed = true;

        let update = subscription.update_expression();

        assert_eq!(
            update.assignments(),
            &[("isConfirmed".to_string(), AttrValue::Bool(true))]
        );
    }

    #[test]
    fn test_round_trips_through_stored_row() {
        let subscription = Subscription::new("reader@example.com");

        let row = item_row(&subscription);
        let restored = Subscription::from_attributes(&row).unwrap();

        assert_eq!(restored, subscription);
    }

    #[test]
    fn test_serializes_with_camel_case_fields() {
        let subscription = Subscription::new("reader@example.com");

        let json = serde_json::to_value(&subscription).unwrap();

        assert_eq!(json["emailAddress"], "reader@example.com");
        assert_eq!(json["isConfirmed"], false);
        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_some());
    }
}
