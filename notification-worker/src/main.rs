use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use notification_worker::health;
use notification_worker::types::environment::Environment;
use notification_worker::worker::UploadNotificationWorker;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = Environment::from_env();

    // JSON for staging/production (Datadog), plain text for development
    if env.json_logs() {
        fmt()
            .json()
            .with_env_filter(EnvFilter::from_default_env())
            .init();
    } else {
        fmt().with_env_filter(EnvFilter::from_default_env()).init();
    }

    info!("Starting upload notification worker in {:?} environment", env);

    let worker = match UploadNotificationWorker::new(env).await {
        Ok(worker) => worker,
        Err(e) => {
            error!("Failed to create worker: {}", e);
            return Err(e);
        }
    };

    let shutdown_token = worker.shutdown_token();

    let health_shutdown = shutdown_token.clone();
    tokio::spawn(async move {
        if let Err(e) = health::start_health_server(health_shutdown).await {
            error!("Health server error: {}", e);
        }
    });

    let signal_shutdown = shutdown_token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl+C, initiating graceful shutdown...");
                signal_shutdown.cancel();
            }
            Err(e) => {
                error!("Failed to listen for Ctrl+C: {}", e);
            }
        }
    });

    worker.start().await;

    info!("Upload notification worker stopped");
    Ok(())
}
