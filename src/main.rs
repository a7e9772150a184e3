//! Memo Gate server
//!
//! Serves the TTL cache over HTTP behind the per-client rate limiter.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use memo_gate::api::create_router;
use memo_gate::{AppState, Config};

/// Main entry point for the Memo Gate server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create cache and rate limiter
/// 4. Start background rate limit sweep
/// 5. Serve HTTP until SIGINT/SIGTERM
/// 6. Destroy the rate limiter
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "memo_gate=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Memo Gate");

    let config = Config::from_env();
    info!(
        "Configuration loaded: cache_max_entries={}, cache_default_ttl={}ms, read_limit={}/{}ms, write_limit={}/{}ms, sweep_interval={}s, port={}",
        config.cache_max_entries,
        config.cache_default_ttl_ms,
        config.rate_limit_max,
        config.rate_limit_window_ms,
        config.rate_limit_write_max,
        config.rate_limit_write_window_ms,
        config.sweep_interval_secs,
        config.server_port
    );

    let state = AppState::from_config(&config);
    state.limiter.start_sweep(config.sweep_interval());
    info!("Cache and rate limiter initialized");

    let limiter = state.limiter.clone();
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

    limiter.destroy();
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
