use std::net::SocketAddr;

use axum::{http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use datadog_tracing::axum::{OtelAxumLayer, OtelInResponseLayer};
use serde_json::json;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

const DEFAULT_PORT: u16 = 8001;

/// Liveness only; queue and mail transport failures surface in the logs
async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "notification-worker",
        })),
    )
}

/// Router serving `GET /health`
pub fn router() -> Router {
    Router::new()
        .route("/health", get(health))
        // Include trace context as header into the response
        .layer(OtelInResponseLayer)
        // Start OpenTelemetry trace on incoming request
        .layer(OtelAxumLayer::default())
}

/// Start the health check HTTP server
///
/// # Errors
///
/// Returns an error if the server fails to bind to the specified address
pub async fn start_health_server(shutdown_token: CancellationToken) -> anyhow::Result<()> {
    let addr = SocketAddr::from((
        [0, 0, 0, 0],
        std::env::var("PORT").map_or(Ok(DEFAULT_PORT), |p| p.parse())?,
    ));
    let listener = TcpListener::bind(addr).await?;
    info!("Health check server listening on {}", addr);

    axum::serve(listener, router())
        .with_graceful_shutdown(async move {
            shutdown_token.cancelled().await;
        })
        .await?;

    Ok(())
}
