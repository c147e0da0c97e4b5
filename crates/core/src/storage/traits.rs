use async_trait::async_trait;

use crate::item::{AttrMap, Item, ItemType};

use super::Result;

/// The single-table store every backend implements.
///
/// Backends take items through the [`Item`] contract, so one store serves
/// every entity type. Creates and deletes also maintain the denormalized
/// per-type counter in the same atomic write: either both the item and the
/// counter change, or neither does.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Validates the item, then writes it and increments its type counter
    /// atomically. Fails with `AlreadyExists` when the key is already taken,
    /// in which case the counter is untouched.
    async fn put_item(&self, item: &dyn Item) -> Result<()>;

    /// Deletes the item and decrements its type counter atomically. Fails
    /// with `NotFound` when the key is absent, in which case the counter is
    /// untouched.
    async fn delete_item(&self, item: &dyn Item) -> Result<()>;

    /// Gets one item by key. With no sort key, returns the first item of the
    /// partition. Absence is `Ok(None)`, never an error.
    async fn get_item(
        &self,
        partition_key: &str,
        sort_key: Option<&str>,
    ) -> Result<Option<AttrMap>>;

    /// Gets every item carrying the given type tag. Counter items carry no
    /// type tag and are never returned.
    async fn query_type(&self, item_type: ItemType) -> Result<Vec<AttrMap>>;

    /// Applies the item's partial-update expression. The counter is not
    /// touched. Fails with `NotFound` when the key is absent.
    async fn update_item(&self, item: &dyn Item) -> Result<()>;
}
