//! Change-feed decorator for stores.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;

use newsletter_core::feed::{ChangeFeed, ChangeRecord};
use newsletter_core::item::{item_row, AttrMap, Item, ItemType};
use newsletter_core::storage::{ItemStore, Result};

/// Maximum number of unconsumed change records per subscriber.
const CHANNEL_CAPACITY: usize = 100;

/// Store decorator that publishes a [`ChangeRecord`] for every committed
/// write.
///
/// Records are published only after the inner store reports success, so a
/// failed write never produces a record. Reads pass through untouched.
pub struct ChangeFeedStore<S: ItemStore> {
    store: Arc<S>,
    sender: broadcast::Sender<ChangeRecord>,
}

impl<S: ItemStore> ChangeFeedStore<S> {
    /// Wraps a store with a change feed.
    pub fn new(store: Arc<S>) -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { store, sender }
    }

    fn publish(&self, record: ChangeRecord) {
        // If there are no receivers, that's fine.
        let _ = self.sender.send(record);
    }
}

impl<S: ItemStore> ChangeFeed for ChangeFeedStore<S> {
    fn subscribe(&self) -> broadcast::Receiver<ChangeRecord> {
        self.sender.subscribe()
    }
}

#[async_trait]
impl<S: ItemStore + 'static> ItemStore for ChangeFeedStore<S> {
    async fn put_item(&self, item: &dyn Item) -> Result<()> {
        self.store.put_item(item).await?;
        self.publish(ChangeRecord::insert(item, item_row(item)));
        Ok(())
    }

    async fn delete_item(&self, item: &dyn Item) -> Result<()> {
        self.store.delete_item(item).await?;
        self.publish(ChangeRecord::remove(item));
        Ok(())
    }

    async fn get_item(
        &self,
        partition_key: &str,
        sort_key: Option<&str>,
    ) -> Result<Option<AttrMap>> {
        self.store.get_item(partition_key, sort_key).await
    }

    async fn query_type(&self, item_type: ItemType) -> Result<Vec<AttrMap>> {
        self.store.query_type(item_type).await
    }

    async fn update_item(&self, item: &dyn Item) -> Result<()> {
        self.store.update_item(item).await?;
        self.publish(ChangeRecord::modify(item, item_row(item)));
        Ok(())
    }
}
