//! Snake Arena Server - Authoritative two-player snake server
//!
//! Clients poll over HTTP; there is no background simulation loop. A match
//! advances by one step whenever a state read arrives after the tick interval
//! has elapsed. This binary handles:
//! - Match creation, joining, and the open-match lobby
//! - Direction input and latency pings
//! - Eviction of idle matches

mod app;
mod config;
mod game;
mod http;
mod lobby;
mod util;

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::AppState;
use crate::config::Config;
use crate::http::build_router;
use crate::util::time::init_server_time;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.log_level);

    // Initialize server time tracking
    init_server_time();

    info!("Starting Snake Arena Server");
    info!("Server address: {}", config.server_addr);
    info!(
        tick_interval_ms = config.tick_interval.as_millis() as u64,
        match_idle_ttl_secs = config.match_idle_ttl.as_secs(),
        "Game timing configured"
    );

    // Create application state
    let state = AppState::new(config.clone());

    // Spawn idle-match sweeper; it also forgets rate-limit state of idle players
    let lobby = state.lobby.clone();
    let rate_limiter = state.rate_limiter.clone();
    let sweep_interval = config.sweep_interval;
    let idle_ttl = config.match_idle_ttl;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_interval);
        loop {
            interval.tick().await;
            let evicted = lobby.sweep(idle_ttl);
            let pruned = rate_limiter.prune();
            if evicted > 0 || pruned > 0 {
                debug!(
                    evicted,
                    pruned_limiters = pruned,
                    tracked_players = rate_limiter.len(),
                    remaining = lobby.active_matches(),
                    "Idle sweep complete"
                );
            }
        }
    });

    // Build router
    let router = build_router(state);

    // Start server
    let addr: SocketAddr = config.server_addr;
    let listener = TcpListener::bind(addr).await?;

    info!("Server listening on {}", addr);
    info!("Health check: http://{}/health", addr);
    info!("Game endpoint: http://{}/api/game", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install terminate handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        }
    }
}
