//! Cantina Server
//!
//! The server owns the whole product surface:
//! - Wine inventory API served from the live mirror
//! - Snapshot streaming via Server-Sent Events
//! - OIDC sign-in for the single active identity
//! - AI sommelier endpoints (when an API key is configured)
//! - Setup mode while the identity provider is unconfigured

use std::time::Duration;

use anyhow::Context;
use auth::{AuthStateStore, DEFAULT_STATE_MAX_AGE_SECS};
use cantina_server::{create_app, init_tracing, AppState, ServerConfig};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::load().context("Failed to load configuration")?;

    init_tracing(&config.log_level);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        setup_required = config.setup_required(),
        "Starting Cantina Server"
    );

    let bind_address = config.bind_address.clone();
    let state = AppState::new(config)
        .await
        .context("Failed to initialize application state")?;

    // Bridge sign-in and sign-out into the mirror's subscription scope
    let _identity_bridge = state.sync.watch_identity(state.session.watch());

    // Sweep pending logins that never came back from the provider
    let sweep_state = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            match sweep_state
                .auth_states
                .cleanup_expired(DEFAULT_STATE_MAX_AGE_SECS)
                .await
            {
                Ok(removed) if removed > 0 => {
                    info!(count = removed, "Expired login states cleaned up");
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "Login state sweep failed"),
            }
        }
    });

    let app = create_app(state);

    let listener = TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {bind_address}"))?;
    info!(address = %bind_address, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        }
    }
}
