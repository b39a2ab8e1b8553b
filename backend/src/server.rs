use std::sync::Arc;
use std::time::Duration;

use aide::openapi::{Info, OpenApi};
use axum::{Extension, Router};
use backend_storage::{file_record::FileRecordStore, queue::UploadNotifier};
use datadog_tracing::axum::{shutdown_signal, OtelAxumLayer, OtelInResponseLayer};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer};

use crate::{
    file_storage::FileStorage,
    routes::{self, files::UploadNotificationDelay},
    types::Environment,
};

const DEFAULT_PORT: u16 = 8000;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Builds the application router with every dependency attached
///
/// Collaborators are handed in as trait objects so callers decide what backs
/// them: AWS clients in the binary, in-memory doubles in tests.
///
/// # Panics
///
/// Panics if `UPLOAD_NOTIFICATION_DELAY_SECS` is out of range
pub fn app(
    environment: Environment,
    file_storage: Arc<FileStorage>,
    file_records: Arc<dyn FileRecordStore>,
    upload_notifier: Arc<dyn UploadNotifier>,
) -> Router {
    let mut openapi = OpenApi {
        info: Info {
            title: "Filedrop API".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            ..Info::default()
        },
        ..OpenApi::default()
    };

    routes::handler(environment.show_api_docs())
        .finish_api(&mut openapi)
        .layer(Extension(openapi))
        .layer(Extension(environment))
        .layer(Extension(UploadNotificationDelay(
            Environment::upload_notification_delay(),
        )))
        .layer(Extension(file_storage))
        .layer(Extension(file_records))
        .layer(Extension(upload_notifier))
        // Browser front end uploads straight to S3 but calls the API cross-origin
        .layer(CorsLayer::permissive())
        // Include trace context as header into the response
        .layer(OtelInResponseLayer)
        // Start OpenTelemetry trace on incoming request
        .layer(OtelAxumLayer::default())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
}

/// Starts the server with the given environment and dependencies
///
/// # Errors
///
/// Returns an error if the server fails to start or bind to the port
pub async fn start(
    environment: Environment,
    file_storage: Arc<FileStorage>,
    file_records: Arc<dyn FileRecordStore>,
    upload_notifier: Arc<dyn UploadNotifier>,
) -> anyhow::Result<()> {
    let router = app(environment, file_storage, file_records, upload_notifier);

    let addr = std::net::SocketAddr::from((
        [0, 0, 0, 0],
        std::env::var("PORT").map_or(Ok(DEFAULT_PORT), |p| p.parse())?,
    ));

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Filedrop API started on http://{addr}");

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(anyhow::Error::from)
}
