//! Universal error handling for the API

use aide::OperationOutput;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use backend_storage::{file_record::FileRecordStorageError, queue::QueueError};
use schemars::JsonSchema;
use serde::Serialize;

use crate::file_storage::BucketError;

/// API error response envelope shared by every endpoint
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorResponse {
    /// Whether the client should retry the request
    pub allow_retry: bool,
    /// Error details
    error: ErrorBody,
}

/// Error body containing code and message
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    /// Machine-readable error code
    pub code: &'static str,
    /// Human-readable error message
    pub message: &'static str,
}

/// Application error type that wraps the API error response
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    inner: ApiErrorResponse,
}

impl AppError {
    /// Create a new application error
    #[must_use]
    pub const fn new(
        status: StatusCode,
        code: &'static str,
        msg: &'static str,
        retry: bool,
    ) -> Self {
        Self {
            status,
            inner: ApiErrorResponse {
                allow_retry: retry,
                error: ErrorBody { code, message: msg },
            },
        }
    }

    /// Non-retryable 400 for a request that failed validation
    #[must_use]
    pub const fn bad_request(code: &'static str, msg: &'static str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, msg, false)
    }

    const fn internal(retry: bool) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            "Internal server error",
            retry,
        )
    }

    /// HTTP status of the response
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable error code
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.inner.error.code
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self.status.as_u16() {
            400..=499 => tracing::warn!(
                "Client error: {} - {}",
                self.inner.error.code,
                self.inner.error.message
            ),
            500..=599 => tracing::error!(
                "Server error: {} - {}",
                self.inner.error.code,
                self.inner.error.message
            ),
            _ => {}
        }

        (self.status, Json(self.inner)).into_response()
    }
}

/// Convert bucket errors to application errors
impl From<BucketError> for AppError {
    #[allow(clippy::cognitive_complexity)]
    fn from(err: BucketError) -> Self {
        use BucketError::{AwsError, ConfigError, ObjectNotFound, S3Error, UpstreamError};

        match &err {
            UpstreamError(msg) => {
                tracing::error!("S3 upstream error: {msg}");
                Self::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "upstream_error",
                    "Storage service temporarily unavailable",
                    true,
                )
            }
            ObjectNotFound(key) => {
                tracing::debug!("Object not found: {key}");
                Self::new(
                    StatusCode::NOT_FOUND,
                    "not_found",
                    "File not found",
                    false,
                )
            }
            S3Error(msg) | AwsError(msg) => {
                tracing::error!("S3/AWS error: {msg}");
                Self::internal(true)
            }
            ConfigError(msg) => {
                tracing::error!("Configuration error: {msg}");
                Self::internal(false)
            }
        }
    }
}

/// Convert file record storage errors to application errors
impl From<FileRecordStorageError> for AppError {
    fn from(err: FileRecordStorageError) -> Self {
        tracing::error!("File record storage error: {err}");
        Self::internal(false)
    }
}

/// Convert queue errors to application errors
impl From<QueueError> for AppError {
    fn from(err: QueueError) -> Self {
        if err.is_upstream_error() {
            tracing::error!("Queue upstream error: {err}");
            return Self::new(
                StatusCode::SERVICE_UNAVAILABLE,
                "upstream_error",
                "Notification queue temporarily unavailable",
                true,
            );
        }

        tracing::error!("Queue error: {err}");
        Self::internal(false)
    }
}

impl OperationOutput for AppError {
    type Inner = ApiErrorResponse;

    fn operation_response(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) -> Option<aide::openapi::Response> {
        Json::<ApiErrorResponse>::operation_response(ctx, operation)
    }
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_envelope_shape() {
        let (status, body) =
            body_json(AppError::bad_request("validation_error", "Name is required")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({
                "allowRetry": false,
                "error": { "code": "validation_error", "message": "Name is required" }
            })
        );
    }

    #[test]
    fn test_bucket_error_mapping() {
        let cases = [
            (
                BucketError::UpstreamError("503".into()),
                StatusCode::SERVICE_UNAVAILABLE,
                true,
            ),
            (
                BucketError::ObjectNotFound("k".into()),
                StatusCode::NOT_FOUND,
                false,
            ),
            (
                BucketError::S3Error("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
                true,
            ),
            (
                BucketError::AwsError("dispatch".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
                true,
            ),
            (
                BucketError::ConfigError("expiry".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
                false,
            ),
        ];

        for (err, status, retry) in cases {
            let app_error = AppError::from(err);
            assert_eq!(app_error.status(), status);
            assert_eq!(app_error.inner.allow_retry, retry);
        }
    }

    #[test]
    fn test_queue_error_mapping() {
        let app_error = AppError::from(QueueError::InvalidDelay(901));
        assert_eq!(app_error.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(app_error.code(), "internal_error");
    }

    #[test]
    fn test_record_error_mapping() {
        let app_error = AppError::from(FileRecordStorageError::SerializationError(
            "bad item".to_string(),
        ));
        assert_eq!(app_error.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!app_error.inner.allow_retry);
    }
}
