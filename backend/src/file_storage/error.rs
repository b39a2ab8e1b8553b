//! Error types for bucket operations

use aws_sdk_s3::{error::SdkError, operation::get_object::GetObjectError};
use thiserror::Error;

/// Result type for bucket operations
pub type BucketResult<T> = Result<T, BucketError>;

/// Errors that can occur during bucket operations
#[derive(Error, Debug)]
pub enum BucketError {
    /// S3 service error
    #[error("S3 service error: {0}")]
    S3Error(String),

    /// Object does not exist in bucket
    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    /// AWS SDK error
    #[error("AWS SDK error: {0}")]
    AwsError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Upstream service error (5xx from S3)
    #[error("Upstream service error: {0}")]
    UpstreamError(String),
}

impl BucketError {
    /// Maps a failed `GetObject` call for `key`
    #[must_use]
    pub fn from_get_object(key: &str, error: SdkError<GetObjectError>) -> Self {
        match error {
            SdkError::ServiceError(service_err) => {
                if matches!(service_err.err(), GetObjectError::NoSuchKey(_)) {
                    Self::ObjectNotFound(key.to_string())
                } else if service_err.raw().status().as_u16() >= 500 {
                    Self::UpstreamError(format!("{:?}", service_err.err()))
                } else {
                    Self::S3Error(format!("{:?}", service_err.err()))
                }
            }
            other => Self::AwsError(other.to_string()),
        }
    }
}
