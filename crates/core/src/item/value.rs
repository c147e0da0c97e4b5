//! Backend-neutral attribute values.
//!
//! Stored rows are maps from attribute name to [`AttrValue`]. The DynamoDB
//! backend converts these to SDK attribute values at its boundary; the
//! in-memory backend stores them directly.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::storage::{Result, StoreError};

/// A single stored attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// A string attribute.
    S(String),
    /// A numeric attribute. Only integer counters are stored.
    N(i64),
    /// A boolean attribute.
    Bool(bool),
}

/// A stored row: attribute name to value.
pub type AttrMap = HashMap<String, AttrValue>;

/// Extracts a required string attribute.
pub fn get_string(attrs: &AttrMap, name: &str) -> Result<String> {
    match attrs.get(name) {
        Some(AttrValue::S(value)) => Ok(value.clone()),
        Some(other) => Err(StoreError::InvalidData(format!(
            "attribute {name} is not a string: {other:?}"
        ))),
        None => Err(StoreError::InvalidData(format!("missing attribute {name}"))),
    }
}

/// Extracts a required boolean attribute.
pub fn get_bool(attrs: &AttrMap, name: &str) -> Result<bool> {
    match attrs.get(name) {
        Some(AttrValue::Bool(value)) => Ok(*value),
        Some(other) => Err(StoreError::InvalidData(format!(
            "attribute {name} is not a boolean: {other:?}"
        ))),
        None => Err(StoreError::InvalidData(format!("missing attribute {name}"))),
    }
}

/// Extracts a required numeric attribute.
pub fn get_number(attrs: &AttrMap, name: &str) -> Result<i64> {
    match attrs.get(name) {
        Some(AttrValue::N(value)) => Ok(*value),
        Some(other) => Err(StoreError::InvalidData(format!(
            "attribute {name} is not a number: {other:?}"
        ))),
        None => Err(StoreError::InvalidData(format!("missing attribute {name}"))),
    }
}

/// Extracts a required UUID attribute stored as a string.
pub fn get_uuid(attrs: &AttrMap, name: &str) -> Result<Uuid> {
    let value = get_string(attrs, name)?;
    Uuid::parse_str(&value)
        .map_err(|err| StoreError::InvalidData(format!("attribute {name} is not a UUID: {err}")))
}

/// Extracts a required RFC 3339 timestamp attribute stored as a string.
pub fn get_datetime(attrs: &AttrMap, name: &str) -> Result<DateTime<Utc>> {
    let value = get_string(attrs, name)?;
    DateTime::parse_from_rfc3339(&value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| {
            StoreError::InvalidData(format!("attribute {name} is not a timestamp: {err}"))
        })
}
