//! Cantina server library
//!
//! Exposes the router and state so tests (and embedders) can assemble the
//! application without binding a socket.

pub mod api;
pub mod auth_routes;
pub mod config;
pub mod error;
pub mod setup;
pub mod sommelier_routes;
pub mod sse;
pub mod state;

#[cfg(test)]
pub mod test_support;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use state::AppState;

/// Creates the application router with all routes configured.
pub fn create_app(state: AppState) -> Router {
    let cors = if state.config.enable_cors {
        if state.config.cors_origins.is_empty() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins: Vec<_> = state
                .config
                .cors_origins
                .iter()
                .filter_map(|s| s.parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    } else {
        CorsLayer::new()
    };

    Router::new()
        .route("/api/wines", get(api::list_wines).post(api::create_wine))
        .route(
            "/api/wines/{id}",
            get(api::get_wine)
                .patch(api::patch_wine)
                .delete(api::delete_wine),
        )
        .route("/api/wines/{id}/quantity", post(api::adjust_quantity))
        .route("/api/stats", get(api::get_stats))
        .route("/api/events", get(sse::handle_events))
        .route("/api/sommelier/label", post(sommelier_routes::analyze_label))
        .route("/api/sommelier/suggest", post(sommelier_routes::suggest_details))
        .route("/auth/login", get(auth_routes::login))
        .route("/auth/callback", get(auth_routes::callback))
        .route("/auth/logout", post(auth_routes::logout))
        .route("/auth/me", get(auth_routes::me))
        .route("/setup", get(setup::status))
        .route("/setup/oidc", post(setup::configure_oidc))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Initializes tracing with the given default log level.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("cantina_server={log_level},tower_http=warn")));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}
