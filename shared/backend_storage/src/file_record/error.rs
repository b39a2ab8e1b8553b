//! Error types for file record storage operations

use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::operation::{put_item::PutItemError, scan::ScanError};
use thiserror::Error;

/// Result type alias for file record storage operations
pub type FileRecordStorageResult<T> = Result<T, FileRecordStorageError>;

/// Storage error types for file record operations
#[derive(Debug, Error)]
pub enum FileRecordStorageError {
    /// Failed to insert file record into `DynamoDB`
    #[error("Failed to insert file record into DynamoDB: {0:?}")]
    DynamoDbPutError(#[from] SdkError<PutItemError>),

    /// Failed to scan file records from `DynamoDB`
    #[error("Failed to scan file records from DynamoDB: {0:?}")]
    DynamoDbScanError(#[from] SdkError<ScanError>),

    /// Failed to convert a file record to or from a `DynamoDB` item
    #[error("Failed to parse file record: {0}")]
    SerializationError(String),
}

impl From<serde_dynamo::Error> for FileRecordStorageError {
    fn from(err: serde_dynamo::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}
