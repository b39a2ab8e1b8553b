//! Environment configuration for different deployment stages

use std::env;
use std::time::Duration;

use aws_config::{retry::RetryConfig, timeout::TimeoutConfig, BehaviorVersion};
use backend_storage::queue::{QueueConfig, MAX_DELAY_SECS};

use crate::file_storage::DEFAULT_PRESIGNED_URL_EXPIRY_SECS;

const LOCALSTACK_ENDPOINT: &str = "http://localhost:4566";
const DEFAULT_UPLOAD_NOTIFICATION_DELAY_SECS: u64 = 30;

/// Application environment configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    /// Production environment
    Production,
    /// Staging environment
    Staging,
    /// Development environment (uses `LocalStack`)
    Development {
        /// Optional override for presigned URL expiry in seconds
        presign_expiry_override: Option<u64>,
    },
}

impl Environment {
    /// Creates an Environment from the `APP_ENV` environment variable
    ///
    /// # Panics
    ///
    /// Panics if `APP_ENV` contains an invalid value or
    /// `UPLOAD_NOTIFICATION_DELAY_SECS` is out of range
    #[must_use]
    pub fn from_env() -> Self {
        let env = env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .trim()
            .to_lowercase();

        // Bad delay settings stop the process at boot, not on the first upload
        let _ = Self::upload_notification_delay();

        match env.as_str() {
            "production" => Self::Production,
            "staging" => Self::Staging,
            "development" => {
                let presign_expiry_override = env::var("PRESIGNED_URL_EXPIRY_SECS")
                    .ok()
                    .and_then(|val| val.parse::<u64>().ok());

                Self::Development {
                    presign_expiry_override,
                }
            }
            _ => panic!("Invalid environment: {env}"),
        }
    }

    /// Returns the S3 bucket name for the environment
    ///
    /// # Panics
    ///
    /// Panics if the `S3_BUCKET_NAME` environment variable is not set outside development
    #[must_use]
    pub fn s3_bucket(&self) -> String {
        match self {
            Self::Production | Self::Staging => {
                env::var("S3_BUCKET_NAME").expect("S3_BUCKET_NAME environment variable is not set")
            }
            Self::Development { .. } => env::var("S3_BUCKET_NAME")
                .unwrap_or_else(|_| "business-rules-processing".to_string()),
        }
    }

    /// Returns the `DynamoDB` table holding file records
    ///
    /// # Panics
    ///
    /// Panics if the `FILES_TABLE_NAME` environment variable is not set outside development
    #[must_use]
    pub fn files_table_name(&self) -> String {
        match self {
            Self::Production | Self::Staging => env::var("FILES_TABLE_NAME")
                .expect("FILES_TABLE_NAME environment variable is not set"),
            Self::Development { .. } => {
                env::var("FILES_TABLE_NAME").unwrap_or_else(|_| "files".to_string())
            }
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
            Self::Development { .. } => {
                env::var("UPLOAD_NOTIFICATION_QUEUE_URL").unwrap_or_else(|_| {
                    format!("{LOCALSTACK_ENDPOINT}/000000000000/upload-notifications")
                })
            }
        }
    }

    /// Queue configuration for scheduling upload notifications
    #[must_use]
    pub fn upload_notification_queue_config(&self) -> QueueConfig {
        QueueConfig {
            queue_url: self.upload_notification_queue_url(),
            default_max_messages: 10,
            default_visibility_timeout: 30,
            default_wait_time_seconds: 20,
        }
    }

    /// Delay between issuing an upload URL and sending the notification
    ///
    /// Read from `UPLOAD_NOTIFICATION_DELAY_SECS`, 30 seconds when unset.
    ///
    /// # Panics
    ///
    /// Panics if the value is not a whole number of seconds or exceeds the
    /// SQS limit of `MAX_DELAY_SECS`
    #[must_use]
    pub fn upload_notification_delay() -> Duration {
        let Ok(raw) = env::var("UPLOAD_NOTIFICATION_DELAY_SECS") else {
            return Duration::from_secs(DEFAULT_UPLOAD_NOTIFICATION_DELAY_SECS);
        };

        let secs = raw.trim().parse::<u64>().unwrap_or_else(|_| {
            panic!("UPLOAD_NOTIFICATION_DELAY_SECS must be a whole number of seconds, got {raw:?}")
        });
        assert!(
            secs <= MAX_DELAY_SECS,
            "UPLOAD_NOTIFICATION_DELAY_SECS must be at most {MAX_DELAY_SECS}, got {secs}"
        );

        Duration::from_secs(secs)
    }

    /// Whether to show API docs
    #[must_use]
    pub const fn show_api_docs(&self) -> bool {
        matches!(self, Self::Development { .. } | Self::Staging)
    }

    /// Whether logs should be emitted as JSON (Datadog ingestion)
    #[must_use]
    pub const fn json_logs(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }

    /// Returns the endpoint URL to use for AWS services
    #[must_use]
    pub const fn override_aws_endpoint_url(&self) -> Option<&str> {
        match self {
            Self::Production | Self::Staging => None,
            Self::Development { .. } => Some(LOCALSTACK_ENDPOINT),
        }
    }

    /// AWS configuration with retry and timeout settings
    pub async fn aws_config(&self) -> aws_config::SdkConfig {
        let retry_config = RetryConfig::standard()
            .with_max_attempts(3)
            .with_initial_backoff(Duration::from_millis(50));

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

        config_builder.build()
    }

    /// AWS S3 service configuration
    pub async fn s3_client_config(&self) -> aws_sdk_s3::Config {
        let aws_config = self.aws_config().await;
        let s3_config: aws_sdk_s3::Config = (&aws_config).into();
        let mut builder = s3_config.to_builder();

        // LocalStack only serves path-style addressing
        // https://github.com/awslabs/aws-sdk-rust/discussions/874
        if matches!(self, Self::Development { .. }) {
            builder.set_force_path_style(Some(true));
        }

        builder.build()
    }

    /// AWS `DynamoDB` service configuration
    pub async fn dynamodb_client_config(&self) -> aws_sdk_dynamodb::Config {
        (&self.aws_config().await).into()
    }

    /// AWS SQS service configuration
    pub async fn sqs_client_config(&self) -> aws_sdk_sqs::Config {
        (&self.aws_config().await).into()
    }

    /// Presigned URL expiry time in seconds
    #[must_use]
    pub fn presigned_url_expiry_secs(&self) -> u64 {
        match self {
            Self::Production | Self::Staging => DEFAULT_PRESIGNED_URL_EXPIRY_SECS,
            Self::Development {
                presign_expiry_override,
            } => presign_expiry_override.unwrap_or(DEFAULT_PRESIGNED_URL_EXPIRY_SECS),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serial_test::serial;

    use super::*;

    #[test]
    #[serial]
    fn test_environment_from_env() {
        // Test development (default)
        env::remove_var("APP_ENV");
        env::remove_var("PRESIGNED_URL_EXPIRY_SECS");
        assert_eq!(
            Environment::from_env(),
            Environment::Development {
                presign_expiry_override: None
            }
        );

        env::set_var("APP_ENV", " Staging ");
        assert_eq!(Environment::from_env(), Environment::Staging);

        env::set_var("APP_ENV", "production");
        assert_eq!(Environment::from_env(), Environment::Production);

        env::remove_var("APP_ENV");
    }

    #[test]
    #[serial]
    #[should_panic(expected = "Invalid environment: invalid")]
    fn test_invalid_environment() {
        env::set_var("APP_ENV", "invalid");
        let _ = Environment::from_env();
    }

    #[test]
    #[serial]
    fn test_presigned_url_expiry_secs() {
        let env = Environment::Development {
            presign_expiry_override: None,
        };
        assert_eq!(env.presigned_url_expiry_secs(), 3600);

        let env = Environment::Development {
            presign_expiry_override: Some(30),
        };
        assert_eq!(env.presigned_url_expiry_secs(), 30);

        assert_eq!(Environment::Production.presigned_url_expiry_secs(), 3600);
        assert_eq!(Environment::Staging.presigned_url_expiry_secs(), 3600);
    }

    #[test]
    #[serial]
    fn test_development_with_expiry_override() {
        env::set_var("APP_ENV", "development");
        env::set_var("PRESIGNED_URL_EXPIRY_SECS", "120");
        assert_eq!(Environment::from_env().presigned_url_expiry_secs(), 120);

        // Unparseable values fall back to the default
        env::set_var("PRESIGNED_URL_EXPIRY_SECS", "invalid");
        assert_eq!(Environment::from_env().presigned_url_expiry_secs(), 3600);

        env::remove_var("PRESIGNED_URL_EXPIRY_SECS");
        env::remove_var("APP_ENV");
    }

    #[test]
    #[serial]
    fn test_development_defaults() {
        env::remove_var("S3_BUCKET_NAME");
        env::remove_var("FILES_TABLE_NAME");
        env::remove_var("UPLOAD_NOTIFICATION_QUEUE_URL");
        env::remove_var("UPLOAD_NOTIFICATION_DELAY_SECS");

        let env = Environment::Development {
            presign_expiry_override: None,
        };
        assert_eq!(env.s3_bucket(), "business-rules-processing");
        assert_eq!(env.files_table_name(), "files");
        assert_eq!(
            env.upload_notification_queue_url(),
            "http://localhost:4566/000000000000/upload-notifications"
        );
        assert_eq!(
            Environment::upload_notification_delay(),
            Duration::from_secs(30)
        );
        assert_eq!(env.override_aws_endpoint_url(), Some("http://localhost:4566"));
        assert!(env.show_api_docs());
        assert!(!env.json_logs());
    }

    #[test]
    #[serial]
    fn test_notification_delay_override() {
        env::set_var("UPLOAD_NOTIFICATION_DELAY_SECS", "5");
        assert_eq!(
            Environment::upload_notification_delay(),
            Duration::from_secs(5)
        );

        env::set_var("UPLOAD_NOTIFICATION_DELAY_SECS", "900");
        assert_eq!(
            Environment::upload_notification_delay(),
            Duration::from_secs(900)
        );
        env::remove_var("UPLOAD_NOTIFICATION_DELAY_SECS");
    }

    #[test]
    #[serial]
    #[should_panic(expected = "UPLOAD_NOTIFICATION_DELAY_SECS must be at most 900, got 901")]
    fn test_notification_delay_over_sqs_limit_fails_at_startup() {
        env::set_var("APP_ENV", "production");
        env::set_var("UPLOAD_NOTIFICATION_DELAY_SECS", "901");

        let result = std::panic::catch_unwind(Environment::from_env);
        env::remove_var("UPLOAD_NOTIFICATION_DELAY_SECS");
        env::remove_var("APP_ENV");

        std::panic::resume_unwind(result.unwrap_err());
    }

    #[test]
    #[serial]
    #[should_panic(expected = "UPLOAD_NOTIFICATION_DELAY_SECS must be a whole number of seconds")]
    fn test_notification_delay_rejects_garbage() {
        env::set_var("UPLOAD_NOTIFICATION_DELAY_SECS", "soon");

        let result = std::panic::catch_unwind(Environment::upload_notification_delay);
        env::remove_var("UPLOAD_NOTIFICATION_DELAY_SECS");

        std::panic::resume_unwind(result.unwrap_err());
    }

    #[test]
    #[serial]
    fn test_production_reads_required_settings() {
        env::set_var("S3_BUCKET_NAME", "prod-files");
        env::set_var("FILES_TABLE_NAME", "prod-file-records");

        let env = Environment::Production;
        assert_eq!(env.s3_bucket(), "prod-files");
        assert_eq!(env.files_table_name(), "prod-file-records");
        assert_eq!(env.override_aws_endpoint_url(), None);
        assert!(!env.show_api_docs());
        assert!(env.json_logs());

        env::remove_var("S3_BUCKET_NAME");
        env::remove_var("FILES_TABLE_NAME");
    }

    #[test]
    #[serial]
    #[should_panic(expected = "UPLOAD_NOTIFICATION_QUEUE_URL environment variable is not set")]
    fn test_production_requires_queue_url() {
        env::remove_var("UPLOAD_NOTIFICATION_QUEUE_URL");
        let _ = Environment::Staging.upload_notification_queue_url();
    }
}
