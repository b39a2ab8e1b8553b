pub mod poller;
pub mod processor;

use std::sync::Arc;

use aws_sdk_sqs::Client as SqsClient;
use backend_storage::queue::{QueueMessage, UploadNotification, UploadNotificationQueue};
use futures::future::join_all;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::mailer::{LettreMailer, Mailer};
use crate::types::environment::Environment;

use self::poller::QueuePoller;
use self::processor::{EmailDispatcher, NotificationProcessor};

/// Message type that flows through the worker pipeline
pub type Message = QueueMessage<UploadNotification>;

/// Upload notification worker: one queue poller feeding N email processors
pub struct UploadNotificationWorker {
    env: Environment,
    queue: Arc<UploadNotificationQueue>,
    dispatcher: Arc<EmailDispatcher>,
    shutdown_token: CancellationToken,
}

impl UploadNotificationWorker {
    /// Creates a new worker from the environment
    ///
    /// # Errors
    ///
    /// Returns an error if the mail transport cannot be configured
    pub async fn new(env: Environment) -> anyhow::Result<Self> {
        let sqs_client = Arc::new(SqsClient::from_conf(env.sqs_client_config().await));
        let queue = Arc::new(UploadNotificationQueue::new(
            sqs_client,
            env.upload_notification_queue_config(),
        ));

        let mailer: Arc<dyn Mailer> =
            Arc::new(LettreMailer::new(&env.email_transport(), &env.email_from())?);
        let recipients = env.notification_recipients();
        info!("Notifying {} recipients per upload", recipients.len());

        Ok(Self {
            dispatcher: Arc::new(EmailDispatcher::new(mailer, recipients)),
            env,
            queue,
            shutdown_token: CancellationToken::new(),
        })
    }

    /// Returns a clone of the shutdown token for external control
    #[must_use]
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// Runs the poller and processors until shutdown
    pub async fn start(self) {
        let num_workers = self.env.num_workers();
        info!("Starting upload notification worker with {num_workers} processors");

        let (message_tx, message_rx) = flume::bounded::<Message>(self.env.channel_capacity());
        info!(
            "Created flume channel with capacity: {}",
            self.env.channel_capacity()
        );

        let processor_handles = self.spawn_processors(num_workers, &message_rx);
        drop(message_rx);

        QueuePoller::new(
            Arc::clone(&self.queue),
            message_tx,
            self.shutdown_token.clone(),
        )
        .run()
        .await;

        self.shutdown_and_cleanup(processor_handles).await;
    }

    fn spawn_processors(
        &self,
        num_workers: usize,
        receiver: &flume::Receiver<Message>,
    ) -> Vec<JoinHandle<()>> {
        (0..num_workers)
            .map(|i| {
                let processor =
                    NotificationProcessor::new(i, Arc::clone(&self.queue), Arc::clone(&self.dispatcher));
                let rx = receiver.clone();
                let shutdown_token = self.shutdown_token.clone();

                tokio::spawn(async move {
                    processor.run(rx, shutdown_token).await;
                })
            })
            .collect()
    }

    async fn shutdown_and_cleanup(&self, processor_handles: Vec<JoinHandle<()>>) {
        self.shutdown_token.cancel();
        info!("Upload notification worker shutdown initiated");

        for result in join_all(processor_handles).await {
            if let Err(e) = result {
                error!("Processor task error: {}", e);
            }
        }
        info!("All upload notification worker components stopped");
    }
}
