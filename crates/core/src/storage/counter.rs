//! Read access to the denormalized per-type counters.
//!
//! Counters are never written directly. The store increments them inside
//! [`put_item`] and decrements them inside [`delete_item`]; this module only
//! derives their keys and reads their current value.
//!
//! [`put_item`]: super::ItemStore::put_item
//! [`delete_item`]: super::ItemStore::delete_item

use crate::item::{get_number, ItemType, ATTR_COUNT};

use super::{ItemStore, Result};

/// The `(partition_key, sort_key)` of the counter item for a type.
pub fn counter_key(item_type: ItemType) -> (String, String) {
    (
        ItemType::Count.as_str().to_string(),
        format!("{}#{}", ItemType::Count, item_type),
    )
}

/// Reads the live count for a type. A counter that has never been written
/// reads as zero.
pub async fn fetch_count(store: &dyn ItemStore, item_type: ItemType) -> Result<i64> {
    let (partition_key, sort_key) = counter_key(item_type);
    match store.get_item(&partition_key, Some(&sort_key)).await? {
        Some(attrs) => get_number(&attrs, ATTR_COUNT),
        None => Ok(0),
    }
}
