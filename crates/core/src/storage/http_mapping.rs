//! Pure functions for mapping store errors to HTTP status codes.
//!
//! This module provides HTTP status code mappings for [`StoreError`] variants,
//! following the Functional Core pattern - pure functions with no side effects.

use super::StoreError;

/// Maps a [`StoreError`] to an HTTP status code.
///
/// This is a pure function that returns the appropriate HTTP status code
/// for each error variant:
///
/// - `NotFound` -> 404 (Not Found)
/// - `AlreadyExists` -> 409 (Conflict)
/// - `Validation` -> 400 (Bad Request)
/// - `InvalidData` -> 400 (Bad Request)
/// - `ConnectionFailed` -> 503 (Service Unavailable)
/// - `Configuration` -> 500 (Internal Server Error)
/// - `Transaction` -> 500 (Internal Server Error)
/// - `QueryFailed` -> 500 (Internal Server Error)
///
/// # Examples
///
/// ```
/// use newsletter_core::item::ItemType;
/// use newsletter_core::storage::{store_error_to_status_code, StoreError};
///
/// let error = StoreError::NotFound {
///     item_type: ItemType::Subscription,
///     key: "SUBSCRIPTION#reader@example.com".to_string(),
/// };
/// assert_eq!(store_error_to_status_code(&error), 404);
/// ```
pub fn store_error_to_status_code(error: &StoreError) -> u16 {
    match error {
        StoreError::NotFound { .. } => 404,
        StoreError::AlreadyExists { .. } => 409,
        StoreError::Validation(_) => 400,
        StoreError::InvalidData(_) => 400,
        StoreError::ConnectionFailed(_) => 503,
        StoreError::Configuration(_) => 500,
        StoreError::Transaction(_) => 500,
        StoreError::QueryFailed(_) => 500,
    }
}
