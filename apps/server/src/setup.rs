//! Setup mode endpoints.
//!
//! When the identity provider section is missing, every core route answers
//! 503 and this minimal surface is the only way forward: it reports what is
//! missing, accepts an OIDC configuration, persists it as a config file and
//! asks for a restart. Nothing cellar-related can happen until then.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

/// Current setup status.
#[derive(Debug, Serialize)]
pub struct SetupStatus {
    /// True while the identity provider is unconfigured.
    pub setup_required: bool,

    /// True when the AI sommelier is configured.
    pub ai_configured: bool,

    /// Where a submitted configuration will be written.
    pub config_path: String,
}

/// Reports whether the server still needs configuring.
///
/// GET /setup
pub async fn status(State(state): State<AppState>) -> Json<SetupStatus> {
    Json(SetupStatus {
        setup_required: state.setup_mode(),
        ai_configured: state.sommelier.is_some(),
        config_path: ServerConfig::write_path().display().to_string(),
    })
}

/// OIDC configuration submitted through the setup surface.
#[derive(Debug, Deserialize)]
pub struct OidcSetupRequest {
    pub issuer_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
}

/// Outcome of a setup submission.
#[derive(Debug, Serialize)]
pub struct SetupResponse {
    /// Path the configuration was written to.
    pub saved_to: String,

    /// What the operator has to do next.
    pub message: String,
}

/// Persists an OIDC configuration and instructs a restart.
///
/// POST /setup/oidc
pub async fn configure_oidc(
    State(state): State<AppState>,
    Json(request): Json<OidcSetupRequest>,
) -> ServerResult<Json<SetupResponse>> {
    if !state.setup_mode() {
        return Err(ServerError::InvalidRequest(
            "the identity provider is already configured".to_string(),
        ));
    }

    for (field, value) in [
        ("issuer_url", &request.issuer_url),
        ("client_id", &request.client_id),
        ("client_secret", &request.client_secret),
        ("redirect_url", &request.redirect_url),
    ] {
        if value.trim().is_empty() {
            return Err(ServerError::InvalidRequest(format!("{field} must not be empty")));
        }
    }

    let mut config = (*state.config).clone();
    config.oidc = Some(auth::OidcConfig::new(
        request.issuer_url,
        request.client_id,
        request.client_secret,
        request.redirect_url,
    ));

    let path = ServerConfig::write_path();
    config.save_to(&path).map_err(|e| {
        error!(error = %e, path = %path.display(), "Failed to persist configuration");
        ServerError::Internal("Failed to persist the configuration".to_string())
    })?;

    info!(path = %path.display(), "OIDC configuration saved");
    Ok(Json(SetupResponse {
        saved_to: path.display().to_string(),
        message: "Configuration saved. Restart the server to apply it.".to_string(),
    }))
}
