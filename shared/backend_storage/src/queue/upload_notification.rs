//! Upload notification queue operations
//!
//! Upload intents are announced through a standard SQS queue. The per-message
//! delay keeps the notification hidden until the client had time to upload.

use std::time::Duration;

use crate::queue::{error::QueueResult, sqs_queue::SqsQueue, types::UploadNotification};

/// Queue carrying deferred upload notifications
pub type UploadNotificationQueue = SqsQueue<UploadNotification>;

/// Capability to schedule an upload notification for deferred delivery
#[async_trait::async_trait]
pub trait UploadNotifier: Send + Sync {
    /// Enqueues `notification`, to be delivered after `delay`
    ///
    /// Returns the queue's message ID.
    async fn schedule(
        &self,
        notification: &UploadNotification,
        delay: Duration,
    ) -> QueueResult<String>;
}

#[async_trait::async_trait]
impl UploadNotifier for UploadNotificationQueue {
    async fn schedule(
        &self,
        notification: &UploadNotification,
        delay: Duration,
    ) -> QueueResult<String> {
        let message_id = self.send_message(notification, delay).await?;
        tracing::debug!(
            "Scheduled upload notification {} for {} in {}s",
            message_id,
            notification.path,
            delay.as_secs()
        );
        Ok(message_id)
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    use std::sync::Mutex;
    use std::time::Duration;

    use super::UploadNotifier;
    use crate::queue::{QueueError, QueueResult, UploadNotification, MAX_DELAY_SECS};

    /// Notifier that records scheduled notifications instead of sending them
    #[derive(Default)]
    pub struct RecordingNotifier {
        scheduled: Mutex<Vec<(UploadNotification, Duration)>>,
        fail: bool,
    }

    impl RecordingNotifier {
        /// Notifier whose every `schedule` call fails and records nothing
        #[must_use]
        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        /// Every notification scheduled so far, with its delay
        ///
        /// # Panics
        ///
        /// Panics if the lock is poisoned
        #[must_use]
        pub fn scheduled(&self) -> Vec<(UploadNotification, Duration)> {
            self.scheduled.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl UploadNotifier for RecordingNotifier {
        async fn schedule(
            &self,
            notification: &UploadNotification,
            delay: Duration,
        ) -> QueueResult<String> {
            if self.fail {
                return Err(QueueError::InvalidDelay(MAX_DELAY_SECS + 1));
            }
            let mut scheduled = self.scheduled.lock().unwrap();
            scheduled.push((notification.clone(), delay));
            Ok(format!("message-{}", scheduled.len()))
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::mock::RecordingNotifier;
    use super::*;

    #[test]
    fn test_upload_notification_wire_format() {
        let notification = UploadNotification {
            path: "abc123_invoice.pdf".to_string(),
            name: "invoice.pdf".to_string(),
        };

        let json = serde_json::to_value(&notification).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "path": "abc123_invoice.pdf", "name": "invoice.pdf" })
        );
    }

    #[tokio::test]
    async fn test_recording_notifier_keeps_delay() {
        let notifier = RecordingNotifier::default();
        let notification = UploadNotification {
            path: "abc123_invoice.pdf".to_string(),
            name: "invoice.pdf".to_string(),
        };

        let message_id = notifier
            .schedule(&notification, Duration::from_secs(30))
            .await
            .unwrap();

        assert_eq!(message_id, "message-1");
        assert_eq!(
            notifier.scheduled(),
            vec![(notification, Duration::from_secs(30))]
        );
    }
}
