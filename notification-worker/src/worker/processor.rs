use std::sync::Arc;

use backend_storage::queue::{UploadNotification, UploadNotificationQueue};
use futures::future::join_all;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::Message;
use crate::mailer::{Email, Mailer};

/// Not every recipient received the notification
#[derive(Error, Debug, PartialEq, Eq)]
#[error("{failed} of {attempted} notification emails failed")]
pub struct DispatchError {
    /// Deliveries that failed
    pub failed: usize,
    /// Deliveries attempted
    pub attempted: usize,
}

/// Sends one email per recipient for an upload notification
pub struct EmailDispatcher {
    mailer: Arc<dyn Mailer>,
    recipients: Vec<String>,
}

impl EmailDispatcher {
    /// Creates a dispatcher delivering through `mailer` to `recipients`
    #[must_use]
    pub fn new(mailer: Arc<dyn Mailer>, recipients: Vec<String>) -> Self {
        Self { mailer, recipients }
    }

    /// Email announcing `notification` to `recipient`
    #[must_use]
    pub fn compose(notification: &UploadNotification, recipient: &str) -> Email {
        Email {
            to: recipient.to_string(),
            subject: format!("New file uploaded: {}", notification.name),
            body: format!(
                "A new file was registered for upload.\n\nName: {}\nPath: {}\n",
                notification.name, notification.path
            ),
        }
    }

    /// Emails every recipient, returning how many deliveries succeeded
    ///
    /// Recipients are mailed concurrently and every one is attempted even
    /// after a failure.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError` if at least one delivery failed
    pub async fn dispatch(&self, notification: &UploadNotification) -> Result<usize, DispatchError> {
        if self.recipients.is_empty() {
            warn!("No notification recipients configured, dropping {}", notification.path);
            return Ok(0);
        }

        let deliveries = self.recipients.iter().map(|recipient| async move {
            let email = Self::compose(notification, recipient);
            self.mailer
                .send(&email)
                .await
                .inspect_err(|e| {
                    error!("Failed to notify {recipient} about {}: {e}", notification.path);
                })
        });

        let failed = join_all(deliveries)
            .await
            .iter()
            .filter(|result| result.is_err())
            .count();

        if failed > 0 {
            return Err(DispatchError {
                failed,
                attempted: self.recipients.len(),
            });
        }

        Ok(self.recipients.len())
    }
}

/// `NotificationProcessor` turns queued upload notifications into emails
pub struct NotificationProcessor {
    worker_id: usize,
    queue: Arc<UploadNotificationQueue>,
    dispatcher: Arc<EmailDispatcher>,
}

impl NotificationProcessor {
    /// Creates a new `NotificationProcessor`
    #[must_use]
    pub const fn new(
        worker_id: usize,
        queue: Arc<UploadNotificationQueue>,
        dispatcher: Arc<EmailDispatcher>,
    ) -> Self {
        Self {
            worker_id,
            queue,
            dispatcher,
        }
    }

    /// Runs the processor loop
    #[allow(clippy::cognitive_complexity)]
    pub async fn run(&self, receiver: flume::Receiver<Message>, shutdown_token: CancellationToken) {
        info!("Notification processor {} started", self.worker_id);

        loop {
            tokio::select! {
                () = shutdown_token.cancelled() => {
                    info!("Notification processor {} received shutdown signal", self.worker_id);
                    break;
                }
                result = receiver.recv_async() => {
                    match result {
                        Ok(message) => {
                            if let Err(e) = self.process_message(&message).await {
                                error!(
                                    "Worker {} failed to process message {}: {}",
                                    self.worker_id, message.message_id, e
                                );
                            }
                        }
                        Err(flume::RecvError::Disconnected) => {
                            info!("Message channel closed for processor {}", self.worker_id);
                            break;
                        }
                    }
                }
            }
        }

        info!("Notification processor {} stopped", self.worker_id);
    }

    /// Emails the recipients, then deletes the message from the queue
    ///
    /// On failure the message stays in flight and SQS redelivers it after the
    /// visibility timeout.
    async fn process_message(&self, message: &Message) -> anyhow::Result<()> {
        let delivered = self.dispatcher.dispatch(&message.body).await?;
        self.queue.ack_message(&message.receipt_handle).await?;

        debug!(
            "Worker {} delivered {} emails for {}",
            self.worker_id, delivered, message.body.path
        );
        Ok(())
    }
}
