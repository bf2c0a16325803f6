use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use telemetry_hub::{
    build_router,
    handlers::AppState,
    store::{ensure_history_file, ReadingLog},
};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn read_env(key: &str, default: &str) -> String {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => default.to_string(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(filter))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let host = read_env("TELEMETRY_HOST", "0.0.0.0");
    let port: u16 = read_env("PORT", "3000").parse().unwrap_or(3000);
    let store_kind = read_env("TELEMETRY_STORE", "file");
    let data_dir = PathBuf::from(read_env("TELEMETRY_DATA_DIR", "data"));

    let state = match store_kind.as_str() {
        "memory" => {
            tracing::info!("history store -> in-memory (lost on restart)");
            Arc::new(AppState {
                sensor: ReadingLog::in_memory(),
                distance: ReadingLog::in_memory(),
            })
        }
        other => {
            if other != "file" {
                tracing::warn!("unknown TELEMETRY_STORE '{other}'; falling back to file");
            }
            let sensor_file = data_dir.join("sensor.json");
            let distance_file = data_dir.join("distance.json");
            ensure_history_file(&sensor_file)
                .await
                .context("initialize sensor history file")?;
            ensure_history_file(&distance_file)
                .await
                .context("initialize distance history file")?;
            tracing::info!(dir = %data_dir.display(), "history store -> file-backed");
            Arc::new(AppState {
                sensor: ReadingLog::file(sensor_file),
                distance: ReadingLog::file(distance_file),
            })
        }
    };

    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!("telemetry-hub listening on http://{addr}");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("telemetry-hub shutdown complete");
    Ok(())
}

#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};
    let mut sigint = signal(SignalKind::interrupt()).expect("listen SIGINT");
    let mut sigterm = signal(SignalKind::terminate()).expect("listen SIGTERM");
    tokio::select! {
        _ = sigint.recv() => {},
        _ = sigterm.recv() => {},
    }
    tracing::info!("shutdown signal received");
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install Ctrl+C handler");
    tracing::info!("shutdown signal received");
}
