use serde::{Deserialize, Serialize};

/// Deferred notification emitted when a client registers an upload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadNotification {
    /// Storage key issued for the upload
    pub path: String,
    /// Logical file name supplied by the client
    pub name: String,
}

/// Wrapper for queue messages with metadata
#[derive(Debug, Clone)]
pub struct QueueMessage<T> {
    /// The message body
    pub body: T,
    /// Receipt handle for acknowledging the message
    pub receipt_handle: String,
    /// Message ID
    pub message_id: String,
}

/// Configuration for queue operations
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Queue URL
    pub queue_url: String,
    /// Default maximum number of messages to retrieve
    pub default_max_messages: i32,
    /// Default visibility timeout for messages (in seconds)
    pub default_visibility_timeout: i32,
    /// Default wait time for long polling
    pub default_wait_time_seconds: i32,
}
