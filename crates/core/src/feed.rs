//! Change-feed records emitted after committed writes.
//!
//! Stores that support it publish one [`ChangeRecord`] for every item write
//! that commits. Consumers subscribe through [`ChangeFeed`] and react after
//! the fact; a slow consumer can lag and miss records, so the feed is a
//! notification channel, not a durability mechanism.

use tokio::sync::broadcast;

use crate::item::{AttrMap, Item, ItemType};

/// What kind of write produced a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// A new item was created.
    Insert,
    /// An existing item was partially updated.
    Modify,
    /// An item was deleted.
    Remove,
}

/// One committed item write, observed after the fact.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeRecord {
    pub kind: ChangeKind,
    pub item_type: ItemType,
    pub partition_key: String,
    pub sort_key: String,
    /// The stored row after the write. Absent for removals.
    pub new_image: Option<AttrMap>,
}

impl ChangeRecord {
    /// Builds the record for a committed create, carrying the stored row.
    pub fn insert(item: &dyn Item, new_image: AttrMap) -> Self {
        Self {
            kind: ChangeKind::Insert,
            item_type: item.item_type(),
            partition_key: item.partition_key(),
            sort_key: item.sort_key(),
            new_image: Some(new_image),
        }
    }

    /// Builds the record for a committed partial update, carrying the stored
    /// row after the update.
    pub fn modify(item: &dyn Item, new_image: AttrMap) -> Self {
        Self {
            kind: ChangeKind::Modify,
            item_type: item.item_type(),
            partition_key: item.partition_key(),
            sort_key: item.sort_key(),
            new_image: Some(new_image),
        }
    }

    /// Builds the record for a committed delete. Only the keys survive.
    pub fn remove(item: &dyn Item) -> Self {
        Self {
            kind: ChangeKind::Remove,
            item_type: item.item_type(),
            partition_key: item.partition_key(),
            sort_key: item.sort_key(),
            new_image: None,
        }
    }
}

/// Source of committed-write records.
pub trait ChangeFeed: Send + Sync {
    /// Subscribes to records for all future committed writes.
    fn subscribe(&self) -> broadcast::Receiver<ChangeRecord>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{AttrValue, Update};
    use crate::storage::ValidationError;

    struct Probe;

    impl Item for Probe {
        fn item_type(&self) -> ItemType {
            ItemType::Subscription
        }

        fn partition_key(&self) -> String {
            "SUBSCRIPTION#reader@example.com".to_string()
        }

        fn sort_key(&self) -> String {
            "SUBSCRIPTION#d31a03f4-0000-4000-8000-000000000000".to_string()
        }

        fn attributes(&self) -> AttrMap {
            AttrMap::new()
        }

        fn update_expression(&self) -> Update {
            Update::new()
        }

        fn validate(&self) -> std::result::Result<(), ValidationError> {
            Ok(())
        }
    }

    #[test]
    fn test_insert_record_carries_new_image() {
        let mut image = AttrMap::new();
        image.insert("isConfirmed".to_string(), AttrValue::Bool(false));

        let record = ChangeRecord::insert(&Probe, image.clone());

        assert_eq!(record.kind, ChangeKind::Insert);
        assert_eq!(record.item_type, ItemType::Subscription);
        assert_eq!(record.partition_key, "SUBSCRIPTION#reader@example.com");
        assert_eq!(record.new_image, Some(image));
    }

    #[test]
    fn test_remove_record_has_no_image() {
        let record = ChangeRecord::remove(&Probe);

        assert_eq!(record.kind, ChangeKind::Remove);
        assert_eq!(record.new_image, None);
        assert_eq!(
            record.sort_key,
            "SUBSCRIPTION#d31a03f4-0000-4000-8000-000000000000"
        );
    }
}
