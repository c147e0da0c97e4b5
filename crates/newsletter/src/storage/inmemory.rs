//! In-memory storage backend.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use newsletter_core::item::{
    item_row, AttrMap, AttrValue, Item, ItemType, ATTR_COUNT, ATTR_ITEM_TYPE,
};
use newsletter_core::storage::{ItemStore, Result, StoreError};

/// In-memory single-table store.
///
/// Rows live in a `BTreeMap` keyed by `(partition key, sort key)` behind an
/// `Arc<RwLock<_>>`, so partition scans see rows in sort-key order. Counter
/// rows share the map with regular items, and every create and delete adjusts
/// the matching counter inside the same write lock, so the item and its
/// counter change together or not at all. Data is not persisted and is lost
/// when the store is dropped.
#[derive(Debug, Clone)]
pub struct InMemoryStore {
    rows: Arc<RwLock<BTreeMap<(String, String), AttrMap>>>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self {
            rows: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }
}

/// Adds `delta` to a counter row, treating a missing counter as zero.
fn adjust_counter(
    rows: &mut BTreeMap<(String, String), AttrMap>,
    partition_key: String,
    sort_key: String,
    delta: i64,
) {
    let counter = rows.entry((partition_key, sort_key)).or_default();
    let current = match counter.get(ATTR_COUNT) {
        Some(AttrValue::N(value)) => *value,
        _ => 0,
    };
    counter.insert(ATTR_COUNT.to_string(), AttrValue::N(current + delta));
}

#[async_trait]
impl ItemStore for InMemoryStore {
    async fn put_item(&self, item: &dyn Item) -> Result<()> {
        item.validate()?;

        let key = (item.partition_key(), item.sort_key());
        let mut rows = self.rows.write().await;
        if rows.contains_key(&key) {
            return Err(StoreError::AlreadyExists {
                item_type: item.item_type(),
                key: key.0,
            });
        }
        rows.insert(key, item_row(item));
        adjust_counter(
            &mut rows,
            item.counter_partition_key(),
            item.counter_sort_key(),
            1,
        );
        Ok(())
    }

    async fn delete_item(&self, item: &dyn Item) -> Result<()> {
        let key = (item.partition_key(), item.sort_key());
        let mut rows = self.rows.write().await;
        if rows.remove(&key).is_none() {
            return Err(StoreError::NotFound {
                item_type: item.item_type(),
                key: key.0,
            });
        }
        adjust_counter(
            &mut rows,
            item.counter_partition_key(),
            item.counter_sort_key(),
            -1,
        );
        Ok(())
    }

    async fn get_item(
        &self,
        partition_key: &str,
        sort_key: Option<&str>,
    ) -> Result<Option<AttrMap>> {
        let rows = self.rows.read().await;
        match sort_key {
            Some(sort_key) => Ok(rows
                .get(&(partition_key.to_string(), sort_key.to_string()))
                .cloned()),
            // BTreeMap order gives the lowest sort key in the partition.
            None => Ok(rows
                .iter()
                .find(|(key, _)| key.0 == partition_key)
                .map(|(_, attrs)| attrs.clone())),
        }
    }

    async fn query_type(&self, item_type: ItemType) -> Result<Vec<AttrMap>> {
        let rows = self.rows.read().await;
        // Counter rows carry no itemType attribute, so they never match.
        Ok(rows
            .values()
            .filter(|attrs| {
                matches!(attrs.get(ATTR_ITEM_TYPE), Some(AttrValue::S(tag)) if tag == item_type.as_str())
            })
            .cloned()
            .collect())
    }

    async fn update_item(&self, item: &dyn Item) -> Result<()> {
        item.validate()?;

        let update = item.update_expression();
        if update.is_empty() {
            return Err(StoreError::InvalidData(
                "Update expression has no assignments".to_string(),
            ));
        }

        let key = (item.partition_key(), item.sort_key());
        let mut rows = self.rows.write().await;
        match rows.get_mut(&key) {
            Some(row) => {
                for (name, value) in update.assignments() {
                    row.insert(name.clone(), value.clone());
                }
                Ok(())
            }
            None => Err(StoreError::NotFound {
                item_type: item.item_type(),
                key: key.0,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use newsletter_core::item::ATTR_PARTITION_KEY;
    use newsletter_core::storage::fetch_count;
    use newsletter_core::subscription::{self, Subscription};
    use uuid::Uuid;

    // ==================== Item Store Tests ====================

    #[tokio::test]
    async fn test_put_and_get_item() {
        let store = InMemoryStore::new();
        let sub = Subscription::new("reader@example.com");

        store.put_item(&sub).await.unwrap();

        let row = store
            .get_item(&sub.partition_key(), Some(&sub.sort_key()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            row.get(ATTR_PARTITION_KEY),
            Some(&AttrValue::S("SUBSCRIPTION#reader@example.com".to_string()))
        );
        assert_eq!(
            row.get(ATTR_ITEM_TYPE),
            Some(&AttrValue::S("SUBSCRIPTION".to_string()))
        );
        assert_eq!(
            row.get("emailAddress"),
            Some(&AttrValue::S("reader@example.com".to_string()))
        );
    }

    #[tokio::test]
    async fn test_get_item_nonexistent() {
        let store = InMemoryStore::new();

        let row = store
            .get_item("SUBSCRIPTION#nobody@example.com", None)
            .await
            .unwrap();

        assert!(row.is_none());
    }

    #[tokio::test]
    async fn test_get_item_by_partition_key_only() {
        let store = InMemoryStore::new();
        let sub = Subscription::new("reader@example.com");

        store.put_item(&sub).await.unwrap();

        let row = store
            .get_item(&sub.partition_key(), None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            row.get("id"),
            Some(&AttrValue::S(sub.id.to_string()))
        );
    }

    #[tokio::test]
    async fn test_get_item_partition_key_picks_lowest_sort_key() {
        let store = InMemoryStore::new();
        let first = Uuid::parse_str("11111111-1111-1111-1111-111111111111").unwrap();
        let second = Uuid::parse_str("22222222-2222-2222-2222-222222222222").unwrap();

        store
            .put_item(&Subscription::with_key("reader@example.com", second))
            .await
            .unwrap();
        store
            .put_item(&Subscription::with_key("reader@example.com", first))
            .await
            .unwrap();

        let row = store
            .get_item("SUBSCRIPTION#reader@example.com", None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.get("id"), Some(&AttrValue::S(first.to_string())));
    }

    #[tokio::test]
    async fn test_put_duplicate_returns_already_exists() {
        let store = InMemoryStore::new();
        let sub = Subscription::new("reader@example.com");

        store.put_item(&sub).await.unwrap();
        let result = store.put_item(&sub).await;

        assert!(matches!(result, Err(StoreError::AlreadyExists { .. })));
        // The failed put must not touch the counter.
        let count = fetch_count(&store, ItemType::Subscription).await.unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_delete_item() {
        let store = InMemoryStore::new();
        let sub = Subscription::new("reader@example.com");

        store.put_item(&sub).await.unwrap();
        store.delete_item(&sub).await.unwrap();

        let row = store
            .get_item(&sub.partition_key(), Some(&sub.sort_key()))
            .await
            .unwrap();
        assert!(row.is_none());
    }

    #[tokio::test]
    async fn test_delete_nonexistent() {
        let store = InMemoryStore::new();
        let sub = Subscription::new("reader@example.com");

        let result = store.delete_item(&sub).await;

        assert!(matches!(result, Err(StoreError::NotFound { .. })));
        let count = fetch_count(&store, ItemType::Subscription).await.unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_query_type_excludes_counter_rows() {
        let store = InMemoryStore::new();

        store
            .put_item(&Subscription::new("first@example.com"))
            .await
            .unwrap();
        store
            .put_item(&Subscription::new("second@example.com"))
            .await
            .unwrap();

        let rows = store.query_type(ItemType::Subscription).await.unwrap();

        assert_eq!(rows.len(), 2);
        for row in &rows {
            assert_eq!(
                row.get(ATTR_ITEM_TYPE),
                Some(&AttrValue::S("SUBSCRIPTION".to_string()))
            );
        }
    }

    #[tokio::test]
    async fn test_update_item_applies_assignments_only() {
        let store = InMemoryStore::new();
        let mut sub = Subscription::new("reader@example.com");

        store.put_item(&sub).await.unwrap();

        sub.is_confirmed = true;
        store.update_item(&sub).await.unwrap();

        let row = store
            .get_item(&sub.partition_key(), Some(&sub.sort_key()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.get("isConfirmed"), Some(&AttrValue::Bool(true)));
        assert_eq!(
            row.get("createdAt"),
            Some(&AttrValue::S(sub.created_at.to_rfc3339()))
        );
    }

    #[tokio::test]
    async fn test_update_nonexistent() {
        let store = InMemoryStore::new();
        let sub = Subscription::new("reader@example.com");

        let result = store.update_item(&sub).await;

        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_put_invalid_item_writes_nothing() {
        let store = InMemoryStore::new();
        let sub = Subscription::new("");

        let result = store.put_item(&sub).await;

        assert!(matches!(result, Err(StoreError::Validation(_))));
        let count = fetch_count(&store, ItemType::Subscription).await.unwrap();
        assert_eq!(count, 0);
        let rows = store.query_type(ItemType::Subscription).await.unwrap();
        assert!(rows.is_empty());
    }

    // ==================== Counter Tests ====================

    #[tokio::test]
    async fn test_count_starts_at_zero() {
        let store = InMemoryStore::new();

        let count = fetch_count(&store, ItemType::Subscription).await.unwrap();

        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_count_tracks_puts_and_deletes() {
        let store = InMemoryStore::new();
        let first = Subscription::new("first@example.com");
        let second = Subscription::new("second@example.com");

        store.put_item(&first).await.unwrap();
        store.put_item(&second).await.unwrap();
        assert_eq!(
            fetch_count(&store, ItemType::Subscription).await.unwrap(),
            2
        );

        store.delete_item(&first).await.unwrap();
        assert_eq!(
            fetch_count(&store, ItemType::Subscription).await.unwrap(),
            1
        );
    }

    // ==================== Subscription Ops Tests ====================

    #[tokio::test]
    async fn test_subscription_lifecycle() {
        let store = InMemoryStore::new();

        let created = subscription::create(&store, "reader@example.com")
            .await
            .unwrap();

        let mut found = subscription::find(&store, "reader@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found, created);
        assert!(!found.is_confirmed);

        subscription::confirm(&store, &mut found).await.unwrap();
        let confirmed = subscription::find(&store, "reader@example.com")
            .await
            .unwrap()
            .unwrap();
        assert!(confirmed.is_confirmed);

        subscription::remove(&store, "reader@example.com", created.id)
            .await
            .unwrap();
        let gone = subscription::find(&store, "reader@example.com")
            .await
            .unwrap();
        assert!(gone.is_none());
        assert_eq!(subscription::count(&store).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_subscription_list() {
        let store = InMemoryStore::new();

        subscription::create(&store, "first@example.com")
            .await
            .unwrap();
        subscription::create(&store, "second@example.com")
            .await
            .unwrap();
        subscription::create(&store, "third@example.com")
            .await
            .unwrap();

        let subs = subscription::list(&store).await.unwrap();

        assert_eq!(subs.len(), 3);
        assert_eq!(subscription::count(&store).await.unwrap(), 3);
    }
}
