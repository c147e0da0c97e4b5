use thiserror::Error;

use crate::item::ItemType;

/// A failed item invariant, raised before anything is written.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Invalid {item_type}: {message}")]
pub struct ValidationError {
    pub item_type: ItemType,
    pub message: String,
}

impl ValidationError {
    pub fn new(item_type: ItemType, message: impl Into<String>) -> Self {
        Self {
            item_type,
            message: message.into(),
        }
    }
}

/// Errors that can occur during store operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{item_type} already exists: {key}")]
    AlreadyExists { item_type: ItemType, key: String },
    #[error("{item_type} not found: {key}")]
    NotFound { item_type: ItemType, key: String },
    #[error("Transaction failed: {0}")]
    Transaction(String),
    #[error("Query failed: {0}")]
    QueryFailed(String),
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
