//! Peercache - a byte-bounded cache node with pluggable eviction
//!
//! Serves one loading cache over HTTP, with background expiry sweeping and
//! periodic snapshots.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use peercache::cache::CacheMemory;
use peercache::{create_router, snapshot, spawn_expiry_sweeper, spawn_snapshot_task, AppState, Config};

/// Main entry point for the cache server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Build the loading cache and restore the last snapshot
/// 4. Start the expiry sweeper and the snapshot task
/// 5. Serve the Axum router on the configured port
/// 6. On SIGINT/SIGTERM, stop background tasks and write a final snapshot
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "peercache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting peercache server");

    let config = Config::from_env();
    info!(
        "Configuration loaded: strategy={}, capacity={} bytes, port={}, snapshot={:?}, peers={}",
        config.strategy,
        config.capacity,
        config.server_port,
        config.snapshot_path,
        config.peers.len()
    );

    let state = AppState::from_config(&config)?;
    let cache = state.cache.clone();

    if let Some(path) = &config.snapshot_path {
        match snapshot::load(path) {
            Ok(records) => {
                let restored = snapshot::restore(cache.store().as_ref(), records);
                info!("Restored {} entries from {}", restored, path.display());
            }
            Err(err) => warn!("Could not read snapshot {}: {}", path.display(), err),
        }
    }

    let sweeper = spawn_expiry_sweeper(cache.store().clone());
    info!("Expiry sweeper started");

    let snapshot_token = CancellationToken::new();
    let snapshot_task = match &config.snapshot_path {
        Some(path) if config.snapshot_interval > 0 => Some(spawn_snapshot_task(
            cache.clone(),
            path.clone(),
            config.snapshot_interval,
            snapshot_token.clone(),
        )),
        _ => None,
    };

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    // Stop background work, then persist what is left
    cache.close();
    snapshot_token.cancel();
    if let Err(err) = sweeper.await {
        warn!("Expiry sweeper ended abnormally: {}", err);
    }
    if let Some(task) = snapshot_task {
        if let Err(err) = task.await {
            warn!("Snapshot task ended abnormally: {}", err);
        }
    }
    if let Some(path) = &config.snapshot_path {
        let saved = snapshot::save(path, &cache.store().get_all())?;
        info!("Final snapshot wrote {} entries", saved);
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
