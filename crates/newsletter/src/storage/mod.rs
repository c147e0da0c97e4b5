//! Storage backend implementations.
//!
//! Concrete implementations of the `ItemStore` trait from
//! `newsletter_core::storage`, selected at compile time via feature flags,
//! plus a change-feed decorator that publishes a record for every committed
//! write.
//!
//! # Feature Flags
//!
//! - `memory` (default): in-memory single-table store, data is lost on restart
//! - `dynamodb`: DynamoDB-backed store using `aws-sdk-dynamodb`
//!
//! These features are mutually exclusive - only one storage backend can be
//! enabled at a time.

#[cfg(all(feature = "memory", feature = "dynamodb"))]
compile_error!(
    "Features 'memory' and 'dynamodb' are mutually exclusive. \
    Enable only one storage backend at a time."
);

#[cfg(not(any(feature = "memory", feature = "dynamodb")))]
compile_error!(
    "No storage backend selected. Enable the 'memory' or 'dynamodb' feature. \
    Example: cargo build --features memory"
);

#[cfg(feature = "dynamodb")]
pub mod dynamodb;
mod feed;
#[cfg(feature = "memory")]
mod inmemory;

#[cfg(feature = "dynamodb")]
pub use dynamodb::DynamoDbStore;
pub use feed::ChangeFeedStore;
#[cfg(feature = "memory")]
pub use inmemory::InMemoryStore;
