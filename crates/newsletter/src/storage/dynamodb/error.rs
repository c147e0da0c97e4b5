//! DynamoDB error mapping.
//!
//! Maps AWS SDK errors to `StoreError` from `newsletter_core::storage`.

use std::fmt::Debug;

use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::operation::get_item::GetItemError;
use aws_sdk_dynamodb::operation::query::QueryError;
use aws_sdk_dynamodb::operation::transact_write_items::TransactWriteItemsError;
use aws_sdk_dynamodb::operation::update_item::UpdateItemError;

use newsletter_core::item::ItemType;
use newsletter_core::storage::StoreError;

/// True for network-level failures that never produced a service response.
fn connection_failure<E, R>(err: &SdkError<E, R>) -> bool {
    matches!(
        err,
        SdkError::DispatchFailure(_) | SdkError::TimeoutError(_)
    )
}

/// True when a canceled transaction contains a failed condition check.
fn condition_check_failed(err: &TransactWriteItemsError) -> bool {
    match err {
        TransactWriteItemsError::TransactionCanceledException(inner) => inner
            .cancellation_reasons()
            .iter()
            .any(|reason| reason.code() == Some("ConditionalCheckFailed")),
        _ => false,
    }
}

/// Map a TransactWriteItems SDK error for a create to StoreError.
///
/// A failed condition check means the item key is already taken.
pub fn map_create_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<TransactWriteItemsError, R>,
    item_type: ItemType,
    key: impl Into<String>,
) -> StoreError {
    let key = key.into();
    if connection_failure(&err) {
        return map_connection_error(err);
    }
    let err = err.into_service_error();
    if condition_check_failed(&err) {
        return StoreError::AlreadyExists { item_type, key };
    }
    match err {
        TransactWriteItemsError::TransactionCanceledException(inner) => StoreError::Transaction(
            format!(
                "Create canceled: {}",
                inner.message().unwrap_or("unknown reason")
            ),
        ),
        TransactWriteItemsError::ResourceNotFoundException(_) => {
            StoreError::QueryFailed("Table not found".to_string())
        }
        TransactWriteItemsError::ProvisionedThroughputExceededException(_) => {
            StoreError::QueryFailed("Throughput exceeded, please retry".to_string())
        }
        TransactWriteItemsError::RequestLimitExceeded(_) => {
            StoreError::QueryFailed("Request limit exceeded, please retry".to_string())
        }
        TransactWriteItemsError::InternalServerError(_) => {
            StoreError::QueryFailed("DynamoDB internal server error".to_string())
        }
        err => StoreError::Transaction(format!("TransactWriteItems failed: {:?}", err)),
    }
}

/// Map a TransactWriteItems SDK error for a delete to StoreError.
///
/// A failed condition check means the item was not there to delete.
pub fn map_delete_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<TransactWriteItemsError, R>,
    item_type: ItemType,
    key: impl Into<String>,
) -> StoreError {
    let key = key.into();
    if connection_failure(&err) {
        return map_connection_error(err);
    }
    let err = err.into_service_error();
    if condition_check_failed(&err) {
        return StoreError::NotFound { item_type, key };
    }
    match err {
        TransactWriteItemsError::TransactionCanceledException(inner) => StoreError::Transaction(
            format!(
                "Delete canceled: {}",
                inner.message().unwrap_or("unknown reason")
            ),
        ),
        TransactWriteItemsError::ResourceNotFoundException(_) => {
            StoreError::QueryFailed("Table not found".to_string())
        }
        TransactWriteItemsError::ProvisionedThroughputExceededException(_) => {
            StoreError::QueryFailed("Throughput exceeded, please retry".to_string())
        }
        TransactWriteItemsError::RequestLimitExceeded(_) => {
            StoreError::QueryFailed("Request limit exceeded, please retry".to_string())
        }
        TransactWriteItemsError::InternalServerError(_) => {
            StoreError::QueryFailed("DynamoDB internal server error".to_string())
        }
        err => StoreError::Transaction(format!("TransactWriteItems failed: {:?}", err)),
    }
}

/// Map a GetItem SDK error to StoreError.
///
/// A missing item is not an error at this layer, so `ResourceNotFoundException`
/// here can only mean the table itself is missing.
pub fn map_get_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<GetItemError, R>,
) -> StoreError {
    if connection_failure(&err) {
        return map_connection_error(err);
    }
    match err.into_service_error() {
        GetItemError::ResourceNotFoundException(_) => {
            StoreError::QueryFailed("Table not found".to_string())
        }
        GetItemError::ProvisionedThroughputExceededException(_) => {
            StoreError::QueryFailed("Throughput exceeded, please retry".to_string())
        }
        GetItemError::RequestLimitExceeded(_) => {
            StoreError::QueryFailed("Request limit exceeded, please retry".to_string())
        }
        GetItemError::InternalServerError(_) => {
            StoreError::QueryFailed("DynamoDB internal server error".to_string())
        }
        err => StoreError::QueryFailed(format!("GetItem failed: {:?}", err)),
    }
}

/// Map a Query SDK error to StoreError.
pub fn map_query_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<QueryError, R>,
) -> StoreError {
    if connection_failure(&err) {
        return map_connection_error(err);
    }
    match err.into_service_error() {
        QueryError::ResourceNotFoundException(_) => {
            StoreError::QueryFailed("Table not found".to_string())
        }
        QueryError::ProvisionedThroughputExceededException(_) => {
            StoreError::QueryFailed("Throughput exceeded, please retry".to_string())
        }
        QueryError::RequestLimitExceeded(_) => {
            StoreError::QueryFailed("Request limit exceeded, please retry".to_string())
        }
        QueryError::InternalServerError(_) => {
            StoreError::QueryFailed("DynamoDB internal server error".to_string())
        }
        err => StoreError::QueryFailed(format!("Query failed: {:?}", err)),
    }
}

/// Map an UpdateItem SDK error to StoreError.
pub fn map_update_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<UpdateItemError, R>,
    item_type: ItemType,
    key: impl Into<String>,
) -> StoreError {
    let key = key.into();
    if connection_failure(&err) {
        return map_connection_error(err);
    }
    match err.into_service_error() {
        UpdateItemError::ConditionalCheckFailedException(_) => {
            StoreError::NotFound { item_type, key }
        }
        UpdateItemError::ResourceNotFoundException(_) => {
            StoreError::QueryFailed("Table not found".to_string())
        }
        UpdateItemError::ProvisionedThroughputExceededException(_) => {
            StoreError::QueryFailed("Throughput exceeded, please retry".to_string())
        }
        UpdateItemError::RequestLimitExceeded(_) => {
            StoreError::QueryFailed("Request limit exceeded, please retry".to_string())
        }
        UpdateItemError::ItemCollectionSizeLimitExceededException(_) => {
            StoreError::QueryFailed("Item collection size limit exceeded".to_string())
        }
        UpdateItemError::TransactionConflictException(_) => {
            StoreError::QueryFailed("Transaction conflict, please retry".to_string())
        }
        UpdateItemError::InternalServerError(_) => {
            StoreError::QueryFailed("DynamoDB internal server error".to_string())
        }
        err => StoreError::QueryFailed(format!("UpdateItem failed: {:?}", err)),
    }
}

/// Map a generic connection/config error to StoreError.
pub fn map_connection_error(err: impl std::fmt::Display) -> StoreError {
    StoreError::ConnectionFailed(err.to_string())
}
