//! The polymorphic item contract for the single-table store.
//!
//! Heterogeneous entity types share one physical table. Each type derives its
//! physical keys from its logical identity as `"<TYPE>#<identity>"`, carries a
//! type tag for secondary-index queries, and names the denormalized counter
//! item that tracks how many live instances of the type exist.

mod update;
mod value;

pub use update::Update;
pub use value::{get_bool, get_datetime, get_number, get_string, get_uuid, AttrMap, AttrValue};

use std::fmt;

use crate::storage::{Result, ValidationError};

/// Attribute name of the partition key.
pub const ATTR_PARTITION_KEY: &str = "pk";
/// Attribute name of the sort key.
pub const ATTR_SORT_KEY: &str = "sk";
/// Attribute name of the type tag, also the hash key of the `Gsi1` index.
pub const ATTR_ITEM_TYPE: &str = "itemType";
/// Attribute name of the counter value on counter items.
pub const ATTR_COUNT: &str = "count";
/// Name of the secondary index keyed on the type tag.
pub const INDEX_ITEM_TYPE: &str = "Gsi1";

/// Closed set of item discriminators stored in the table.
///
/// `Count` tags the denormalized counter items; counter rows are only ever
/// written through the additive updates inside the write/delete transactions
/// and never carry an `itemType` attribute themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemType {
    Subscription,
    Count,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Subscription => "SUBSCRIPTION",
            ItemType::Count => "COUNT",
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contract every entity stored in the table implements.
///
/// Key derivation is pure computation; the store validates and persists. Keys
/// are composed as `"<TYPE>#<identity-component>"` so distinct types can never
/// collide within the shared table.
pub trait Item: Send + Sync {
    /// The type tag stored alongside the item and used for type-scoped queries.
    fn item_type(&self) -> ItemType;

    /// The partition key of the item.
    fn partition_key(&self) -> String;

    /// The sort key of the item.
    fn sort_key(&self) -> String;

    /// The partition key of the counter item tracking this item's type.
    fn counter_partition_key(&self) -> String {
        ItemType::Count.as_str().to_string()
    }

    /// The sort key of the counter item tracking this item's type.
    fn counter_sort_key(&self) -> String {
        format!("{}#{}", ItemType::Count, self.item_type())
    }

    /// The item's data attributes, excluding the key and type-tag attributes.
    fn attributes(&self) -> AttrMap;

    /// The partial-update expression applied by [`update_item`], covering only
    /// the fields the variant declares mutable after creation.
    ///
    /// [`update_item`]: crate::storage::ItemStore::update_item
    fn update_expression(&self) -> Update;

    /// Validates the item's invariants. Runs before every create; a failure
    /// aborts the write with nothing persisted.
    fn validate(&self) -> std::result::Result<(), ValidationError>;
}

/// Reconstructs an entity from its stored attributes.
pub trait FromAttributes: Sized {
    fn from_attributes(attrs: &AttrMap) -> Result<Self>;
}

/// Composes the full stored row for an item: its data attributes plus the
/// `pk`, `sk` and `itemType` attributes. Every backend persists exactly this
/// map, which keeps the wire shape identical across them.
pub fn item_row(item: &dyn Item) -> AttrMap {
    let mut attrs = item.attributes();
    attrs.insert(
        ATTR_PARTITION_KEY.to_string(),
        AttrValue::S(item.partition_key()),
    );
    attrs.insert(ATTR_SORT_KEY.to_string(), AttrValue::S(item.sort_key()));
    attrs.insert(
        ATTR_ITEM_TYPE.to_string(),
        AttrValue::S(item.item_type().to_string()),
    );
    attrs
}
