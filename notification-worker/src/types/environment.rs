//! Environment configuration for different deployment stages

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use aws_config::{retry::RetryConfig, timeout::TimeoutConfig, BehaviorVersion};
use backend_storage::queue::QueueConfig;

use crate::mailer::EmailTransportConfig;

const LOCALSTACK_ENDPOINT: &str = "http://localhost:4566";
const DEFAULT_SMTP_PORT: u16 = 587;

/// Application environment configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    /// Production environment
    Production,
    /// Staging environment
    Staging,
    /// Development environment (uses `LocalStack` and writes emails to disk)
    Development,
}

impl Environment {
    /// Creates an Environment from the `APP_ENV` environment variable
    ///
    /// # Panics
    ///
    /// Panics if `APP_ENV` contains an invalid value
    #[must_use]
    pub fn from_env() -> Self {
        let env = env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .trim()
            .to_lowercase();

        match env.as_str() {
            "production" => Self::Production,
            "staging" => Self::Staging,
            "development" => Self::Development,
            _ => panic!("Invalid environment: {env}"),
        }
    }

    /// Whether logs should be emitted as JSON (Datadog ingestion)
    #[must_use]
    pub const fn json_logs(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }

    /// Returns the default number of workers for this environment
    #[must_use]
    pub const fn default_num_workers(&self) -> usize {
        match self {
            Self::Production | Self::Staging => 10,
            Self::Development => 4,
        }
    }

    /// Number of notification processors, overridable with `NUM_WORKERS`
    #[must_use]
    pub fn num_workers(&self) -> usize {
        env::var("NUM_WORKERS")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|n| *n > 0)
            .unwrap_or_else(|| self.default_num_workers())
    }

    /// Capacity of the channel between the poller and the processors
    #[must_use]
    pub fn channel_capacity(&self) -> usize {
        self.num_workers() * 2
    }

    /// Addresses that receive a notification for every upload
    ///
    /// Read from the comma separated `NOTIFICATION_RECIPIENTS`.
    #[must_use]
    pub fn notification_recipients(&self) -> Vec<String> {
        env::var("NOTIFICATION_RECIPIENTS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|addr| !addr.is_empty())
            .map(ToString::to_string)
            .collect()
    }

    /// Sender mailbox of notification emails
    ///
    /// # Panics
    ///
    /// Panics if `EMAIL_FROM` is not set outside development
    #[must_use]
    pub fn email_from(&self) -> String {
        match self {
            Self::Production | Self::Staging => {
                env::var("EMAIL_FROM").expect("EMAIL_FROM environment variable is not set")
            }
            Self::Development => env::var("EMAIL_FROM")
                .unwrap_or_else(|_| "Filedrop <no-reply@filedrop.local>".to_string()),
        }
    }

    /// How outgoing email is delivered
    ///
    /// SMTP with STARTTLS in production and staging, `.eml` files on disk in
    /// development.
    ///
    /// # Panics
    ///
    /// Panics if a required SMTP variable is not set outside development
    #[must_use]
    pub fn email_transport(&self) -> EmailTransportConfig {
        match self {
            Self::Production | Self::Staging => EmailTransportConfig::Smtp {
                host: env::var("SMTP_HOST").expect("SMTP_HOST environment variable is not set"),
                port: env::var("SMTP_PORT")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_SMTP_PORT),
                username: env::var("SMTP_USERNAME")
                    .expect("SMTP_USERNAME environment variable is not set"),
                password: env::var("SMTP_PASSWORD")
                    .expect("SMTP_PASSWORD environment variable is not set"),
            },
            Self::Development => EmailTransportConfig::File {
                path: PathBuf::from(
                    env::var("EMAIL_OUTPUT_DIR").unwrap_or_else(|_| "./emails".to_string()),
                ),
            },
        }
    }

    /// Returns the URL of the upload notification queue
    ///
    /// # Panics
    ///
    /// Panics if `UPLOAD_NOTIFICATION_QUEUE_URL` is not set outside development
    #[must_use]
    pub fn upload_notification_queue_url(&self) -> String {
        match self {
            Self::Production | Self::Staging => env::var("UPLOAD_NOTIFICATION_QUEUE_URL")
                .expect("UPLOAD_NOTIFICATION_QUEUE_URL environment variable is not set"),
            Self::Development => env::var("UPLOAD_NOTIFICATION_QUEUE_URL").unwrap_or_else(|_| {
                format!("{LOCALSTACK_ENDPOINT}/000000000000/upload-notifications")
            }),
        }
    }

    /// Queue configuration for consuming upload notifications
    ///
    /// The visibility timeout bounds how long the emails for one message may
    /// take before SQS hands the message to another processor. Recipients are
    /// mailed concurrently, so it covers one slow SMTP exchange with margin.
    #[must_use]
    pub fn upload_notification_queue_config(&self) -> QueueConfig {
        QueueConfig {
            queue_url: self.upload_notification_queue_url(),
            default_max_messages: 10,
            default_visibility_timeout: 120,
            default_wait_time_seconds: 20,
        }
    }

    /// Returns the endpoint URL to use for AWS services
    #[must_use]
    pub const fn override_aws_endpoint_url(&self) -> Option<&str> {
        match self {
            Self::Production | Self::Staging => None,
            Self::Development => Some(LOCALSTACK_ENDPOINT),
        }
    }

    /// AWS SQS service configuration
    pub async fn sqs_client_config(&self) -> aws_sdk_sqs::Config {
        let retry_config = RetryConfig::standard()
            .with_max_attempts(3)
            .with_initial_backoff(Duration::from_millis(50));

        // Long polls hold the connection for up to 20 seconds
        let timeout_config = TimeoutConfig::builder()
            .operation_timeout(Duration::from_secs(30))
            .build();

        let mut config_builder = aws_config::load_defaults(BehaviorVersion::latest())
            .await
            .to_builder()
            .retry_config(retry_config)
            .timeout_config(timeout_config);

        if let Some(endpoint_url) = self.override_aws_endpoint_url() {
            config_builder = config_builder.endpoint_url(endpoint_url);
        }

        (&config_builder.build()).into()
    }
}
