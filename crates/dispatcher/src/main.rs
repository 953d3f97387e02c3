//! Ping dispatcher server.

use std::sync::Arc;

use database::Database;
use dispatcher::{app, AppState, Config, SweepTask};
use push_gateway::PushClient;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!(addr = %config.addr, "Starting ping dispatcher");

    // Connect to database
    let db = Database::connect(&config.database_url).await?;
    db.migrate().await?;

    // Push delivery
    let gateway = PushClient::new(config.push.clone())?;
    info!(project = %config.push.project_id, "Push gateway ready");

    // Retention sweep
    let sweep = SweepTask::new(db.clone())
        .with_retention(config.retention)
        .with_period(config.sweep_interval);
    sweep.start();

    let router = app(AppState::new(db.clone(), Arc::new(gateway)));

    // Start server
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    info!(addr = %config.addr, "Ping dispatcher listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweep.stop();
    db.close().await;
    info!("Ping dispatcher stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
