//! Generic SQS queue implementation
//!
//! This module provides a generic standard-queue implementation that can be
//! used with any message type that implements the required traits.

use std::sync::Arc;
use std::time::Duration;

use aws_sdk_sqs::{types::Message, Client as SqsClient};
use serde::{de::DeserializeOwned, Serialize};

use crate::queue::{
    error::{QueueError, QueueResult},
    types::{QueueConfig, QueueMessage},
};

/// Largest per-message delay accepted by SQS
pub const MAX_DELAY_SECS: u64 = 900;

/// Generic SQS queue for handling any message type
pub struct SqsQueue<T> {
    sqs_client: Arc<SqsClient>,
    config: QueueConfig,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> SqsQueue<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    /// Creates a new generic SQS queue
    ///
    /// # Arguments
    ///
    /// * `sqs_client` - Pre-configured SQS client
    /// * `config` - Queue configuration including URL and default parameters
    #[must_use]
    pub const fn new(sqs_client: Arc<SqsClient>, config: QueueConfig) -> Self {
        Self {
            sqs_client,
            config,
            _phantom: std::marker::PhantomData,
        }
    }

    /// Converts a delivery delay to the whole seconds SQS expects
    ///
    /// # Errors
    ///
    /// Returns `QueueError::InvalidDelay` if the delay exceeds `MAX_DELAY_SECS`
    pub fn delay_seconds(delay: Duration) -> QueueResult<i32> {
        let secs = delay.as_secs();
        if secs > MAX_DELAY_SECS {
            return Err(QueueError::InvalidDelay(secs));
        }
        i32::try_from(secs).map_err(|_| QueueError::InvalidDelay(secs))
    }

    /// Sends a message to the queue, hidden from consumers for `delay`
    ///
    /// # Arguments
    ///
    /// * `message` - The message to send
    /// * `delay` - How long SQS withholds the message before delivery
    ///
    /// # Returns
    ///
    /// The message ID if successful or an empty string
    ///
    /// # Errors
    ///
    /// Returns `QueueError` if the delay is out of range or the send operation fails
    pub async fn send_message(&self, message: &T, delay: Duration) -> QueueResult<String> {
        let delay_seconds = Self::delay_seconds(delay)?;
        let body = serde_json::to_string(message)?;

        let result = self
            .sqs_client
            .send_message()
            .queue_url(&self.config.queue_url)
            .message_body(body)
            .delay_seconds(delay_seconds)
            .send()
            .await?;

        Ok(result
            .message_id()
            .map(std::string::ToString::to_string)
            .unwrap_or_default())
    }

    /// Splits a received batch into decoded messages and the receipt handles
    /// of messages that can never be decoded
    ///
    /// Messages without a receipt handle cannot be deleted and are dropped.
    #[must_use]
    pub fn decode_messages(messages: &[Message]) -> (Vec<QueueMessage<T>>, Vec<String>) {
        let mut decoded = Vec::with_capacity(messages.len());
        let mut undecodable = Vec::new();

        for msg in messages {
            let Some(receipt_handle) = msg.receipt_handle() else {
                tracing::warn!("Skipping message without receipt handle");
                continue;
            };
            let message_id = msg.message_id().unwrap_or_default().to_string();

            match serde_json::from_str::<T>(msg.body().unwrap_or_default()) {
                Ok(body) => decoded.push(QueueMessage {
                    body,
                    receipt_handle: receipt_handle.to_string(),
                    message_id,
                }),
                Err(e) => {
                    tracing::error!("Discarding undecodable message {message_id}: {e}");
                    undecodable.push(receipt_handle.to_string());
                }
            }
        }

        (decoded, undecodable)
    }

    /// Polls messages from the queue
    ///
    /// Messages whose body cannot be parsed are deleted so they do not come
    /// back after every visibility timeout.
    ///
    /// # Errors
    ///
    /// Returns `QueueError` if the poll operation fails
    pub async fn poll_messages(&self) -> QueueResult<Vec<QueueMessage<T>>> {
        let result = self
            .sqs_client
            .receive_message()
            .queue_url(&self.config.queue_url)
            .max_number_of_messages(self.config.default_max_messages)
            .visibility_timeout(self.config.default_visibility_timeout)
            .wait_time_seconds(self.config.default_wait_time_seconds)
            .send()
            .await?;

        let (messages, undecodable) = Self::decode_messages(result.messages());

        for receipt_handle in undecodable {
            if let Err(e) = self.ack_message(&receipt_handle).await {
                tracing::error!("Failed to delete undecodable message: {e}");
            }
        }

        Ok(messages)
    }

    /// Acknowledges receipt of a message by deleting it from the queue
    ///
    /// # Arguments
    ///
    /// * `receipt_handle` - The receipt handle from the received message
    ///
    /// # Errors
    ///
    /// Returns `QueueError` if the acknowledgment fails
    pub async fn ack_message(&self, receipt_handle: &str) -> QueueResult<()> {
        self.sqs_client
            .delete_message()
            .queue_url(&self.config.queue_url)
            .receipt_handle(receipt_handle)
            .send()
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::UploadNotification;

    type Queue = SqsQueue<UploadNotification>;

    #[test]
    fn test_delay_seconds_within_range() {
        assert_eq!(Queue::delay_seconds(Duration::ZERO).unwrap(), 0);
        assert_eq!(Queue::delay_seconds(Duration::from_secs(30)).unwrap(), 30);
        assert_eq!(Queue::delay_seconds(Duration::from_secs(900)).unwrap(), 900);
    }

    #[test]
    fn test_delay_seconds_truncates_fractional_seconds() {
        assert_eq!(
            Queue::delay_seconds(Duration::from_millis(30_999)).unwrap(),
            30
        );
    }

    fn sqs_message(id: &str, body: &str, receipt_handle: Option<&str>) -> Message {
        Message::builder()
            .message_id(id)
            .body(body)
            .set_receipt_handle(receipt_handle.map(ToString::to_string))
            .build()
    }

    #[test]
    fn test_decode_messages_separates_undecodable() {
        let batch = vec![
            sqs_message(
                "m-1",
                r#"{"path":"abc_invoice.pdf","name":"invoice.pdf"}"#,
                Some("rh-1"),
            ),
            sqs_message("m-2", "not json", Some("rh-2")),
            sqs_message("m-3", r#"{"path":"no-name"}"#, Some("rh-3")),
            sqs_message("m-4", r#"{"path":"p","name":"n"}"#, None),
        ];

        let (decoded, undecodable) = Queue::decode_messages(&batch);

        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].message_id, "m-1");
        assert_eq!(decoded[0].receipt_handle, "rh-1");
        assert_eq!(decoded[0].body.name, "invoice.pdf");
        assert_eq!(undecodable, vec!["rh-2".to_string(), "rh-3".to_string()]);
    }

    #[test]
    fn test_delay_seconds_rejects_over_maximum() {
        let err = Queue::delay_seconds(Duration::from_secs(901)).unwrap_err();
        assert!(matches!(err, QueueError::InvalidDelay(901)));
        assert!(!err.is_upstream_error());
    }
}
