//! DynamoDB storage backend implementation.
//!
//! This module is only compiled when the `dynamodb` feature is enabled.

mod conversions;
mod error;
mod store;

pub use store::DynamoDbStore;
