use std::sync::Arc;
use std::time::Duration;

use backend_storage::queue::UploadNotificationQueue;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::Message;

/// Pause after a failed receive before polling again
pub const POLL_ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// Long-polls the upload notification queue and feeds the processors
pub struct QueuePoller {
    queue: Arc<UploadNotificationQueue>,
    sender: flume::Sender<Message>,
    shutdown_token: CancellationToken,
}

impl QueuePoller {
    /// Creates a new `QueuePoller`
    #[must_use]
    pub const fn new(
        queue: Arc<UploadNotificationQueue>,
        sender: flume::Sender<Message>,
        shutdown_token: CancellationToken,
    ) -> Self {
        Self {
            queue,
            sender,
            shutdown_token,
        }
    }

    /// Polls until shutdown or until every processor has gone away
    pub async fn run(self) {
        info!("Queue poller started");

        loop {
            let result = tokio::select! {
                () = self.shutdown_token.cancelled() => break,
                result = self.queue.poll_messages() => result,
            };

            match result {
                Ok(messages) => {
                    if !messages.is_empty() {
                        debug!("Received {} upload notifications", messages.len());
                    }
                    for message in messages {
                        // Bounded channel: waits while every processor is busy
                        if self.sender.send_async(message).await.is_err() {
                            info!("Processor channel closed, stopping poller");
                            return;
                        }
                    }
                }
                Err(e) => {
                    error!("Failed to poll upload notifications: {e}");
                    tokio::select! {
                        () = self.shutdown_token.cancelled() => break,
                        () = tokio::time::sleep(POLL_ERROR_BACKOFF) => {}
                    }
                }
            }
        }

        info!("Queue poller stopped");
    }
}
