use std::sync::Arc;

use aws_sdk_dynamodb::Client as DynamoDbClient;
use aws_sdk_s3::Client as S3Client;
use aws_sdk_sqs::Client as SqsClient;
use backend_storage::{file_record::FileRecordStorage, queue::UploadNotificationQueue};
use filedrop_api::{file_storage::FileStorage, server, types::Environment};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let environment = Environment::from_env();

    // JSON for staging/production (Datadog), plain text for development
    if environment.json_logs() {
        fmt()
            .json()
            .with_env_filter(EnvFilter::from_default_env())
            .init();
    } else {
        fmt().with_env_filter(EnvFilter::from_default_env()).init();
    }

    let s3_client = Arc::new(S3Client::from_conf(environment.s3_client_config().await));
    let file_storage = Arc::new(FileStorage::new(s3_client, environment.s3_bucket()));

    let dynamodb_client = Arc::new(DynamoDbClient::from_conf(
        environment.dynamodb_client_config().await,
    ));
    let file_records = Arc::new(FileRecordStorage::new(
        dynamodb_client,
        environment.files_table_name(),
    ));

    let sqs_client = Arc::new(SqsClient::from_conf(environment.sqs_client_config().await));
    let upload_notifier = Arc::new(UploadNotificationQueue::new(
        sqs_client,
        environment.upload_notification_queue_config(),
    ));

    tracing::info!(
        "Serving bucket {} in {:?}",
        file_storage.bucket_name(),
        environment
    );

    server::start(environment, file_storage, file_records, upload_notifier).await
}
