//! VitalWatch: clinical early-warning service
//!
//! Main entry point for the HTTP server.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use vitalwatch::adapters::model::{ModelStore, TrainingConfig};
use vitalwatch::adapters::sanitize::SanitizingMakeWriter;
use vitalwatch::adapters::sqlite::SqliteStorage;
use vitalwatch::api::{self, AppState};
use vitalwatch::config::{AppConfig, LogMode};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env()?;

    // The guard flushes the non-blocking writer on drop; keep it alive for main.
    let (writer, _guard) = match config.log_mode {
        LogMode::File => {
            if let Some(parent) = config.log_file.parent() {
                // Best-effort: the open below reports the real failure.
                let _ = std::fs::create_dir_all(parent);
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&config.log_file)
                .with_context(|| format!("opening log file {}", config.log_file.display()))?;
            tracing_appender::non_blocking(file)
        }
        LogMode::Stdout => tracing_appender::non_blocking(std::io::stdout()),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(SanitizingMakeWriter::new(writer)))
        .init();

    tracing::info!("Starting VitalWatch...");

    let storage = Arc::new(
        SqliteStorage::new(&config.db_path)
            .with_context(|| format!("opening database {}", config.db_path.display()))?,
    );
    tracing::info!(path = %config.db_path.display(), "Database ready");

    let model = ModelStore::new(&config.model_dir)
        .load_or_train(&TrainingConfig::default())
        .context("preparing risk model")?;

    let app = api::router(AppState::new(storage, Arc::new(model)));

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("binding {}", config.bind))?;
    tracing::info!(addr = %config.bind, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("VitalWatch shutdown complete.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
