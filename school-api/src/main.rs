//! school-api - HTTP service for student, course and enrollment records

use anyhow::{Context, Result};
use clap::Parser;
use school_common::api::{resolve_api_key, ApiKeySource};
use school_common::config::ServiceConfig;
use school_common::db::init_database;
use school_api::cli::{init_tracing, ConfigArgs};
use school_api::{build_router, AppState};
use tokio::signal;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "school-api")]
#[command(about = "School records HTTP service")]
#[command(version)]
struct Args {
    #[command(flatten)]
    config: ConfigArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = ServiceConfig::resolve(args.config.into()).context("Invalid configuration")?;

    init_tracing(&config.log_level)?;

    info!(
        "Starting school-api v{} on {}",
        env!("CARGO_PKG_VERSION"),
        config.bind_addr
    );
    info!("Database path: {}", config.database_path.display());

    let pool = match init_database(&config.database_path).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to open database: {}", e);
            return Err(e.into());
        }
    };

    let (api_key, source) = resolve_api_key(&pool, config.api_key.as_deref())
        .await
        .context("Failed to resolve API key")?;
    match source {
        ApiKeySource::Configured => info!("Using configured API key"),
        ApiKeySource::Stored => info!("Using API key stored in settings table"),
        ApiKeySource::Generated => {
            warn!("No API key configured; generated one and stored it in settings table")
        }
    }

    let state = AppState::new(pool.clone(), api_key).with_max_upload_bytes(config.max_upload_bytes);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;
    info!("Listening on http://{}", config.bind_addr);
    info!("Health check: http://{}/health", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    pool.close().await;
    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received terminate signal, shutting down"),
    }
}
