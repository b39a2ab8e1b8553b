//! Queue operations for the Filedrop backend
//!
//! This module provides functionality for interacting with AWS SQS standard
//! queues, carrying deferred upload notifications from the API to the
//! notification worker.

/// Error types for queue operations
pub mod error;
/// Generic SQS queue
pub mod sqs_queue;
/// Common types for queue operations
pub mod types;
/// Upload notification queue functionality
pub mod upload_notification;

pub use error::{QueueError, QueueResult};
pub use sqs_queue::{SqsQueue, MAX_DELAY_SECS};
pub use types::{QueueConfig, QueueMessage, UploadNotification};
pub use upload_notification::{UploadNotificationQueue, UploadNotifier};
