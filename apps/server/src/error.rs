//! Server error types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Error codes carried in every JSON error body.
pub mod error_codes {
    pub const INVALID_REQUEST: &str = "invalid_request";
    pub const NOT_FOUND: &str = "not_found";
    pub const AUTHENTICATION_REQUIRED: &str = "authentication_required";
    pub const SETUP_REQUIRED: &str = "setup_required";
    pub const AI_UNAVAILABLE: &str = "ai_unavailable";
    pub const SUGGESTION_FAILED: &str = "suggestion_failed";
    pub const AUTH_ERROR: &str = "auth_error";
    pub const INTERNAL_ERROR: &str = "internal_error";
}

/// Server error type.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Invalid request parameters.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Authentication required.
    #[error("Authentication required")]
    AuthenticationRequired,

    /// Identity provider not configured; the server runs in setup mode.
    #[error("Server is not configured yet")]
    SetupRequired,

    /// The AI sommelier is not configured.
    #[error("AI features are not configured")]
    AiUnavailable,

    /// A sommelier call failed.
    #[error("Suggestion failed: {0}")]
    Suggestion(#[from] sommelier::SommelierError),

    /// Store error.
    #[error("Store error: {0}")]
    Store(#[from] cellar_store::StoreError),

    /// Authentication flow error.
    #[error("Auth error: {0}")]
    Auth(#[from] auth::AuthError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            ServerError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, error_codes::INVALID_REQUEST, msg.clone())
            }
            ServerError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, error_codes::NOT_FOUND, msg.clone())
            }
            ServerError::AuthenticationRequired => (
                StatusCode::UNAUTHORIZED,
                error_codes::AUTHENTICATION_REQUIRED,
                "Authentication required".to_string(),
            ),
            ServerError::SetupRequired => (
                StatusCode::SERVICE_UNAVAILABLE,
                error_codes::SETUP_REQUIRED,
                "The identity provider is not configured; visit /setup".to_string(),
            ),
            ServerError::AiUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                error_codes::AI_UNAVAILABLE,
                "AI features are disabled; no API key is configured".to_string(),
            ),
            ServerError::Suggestion(e) => (
                StatusCode::BAD_GATEWAY,
                error_codes::SUGGESTION_FAILED,
                e.user_message(),
            ),
            ServerError::Store(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_codes::INTERNAL_ERROR,
                e.to_string(),
            ),
            ServerError::Auth(e) => {
                (StatusCode::BAD_GATEWAY, error_codes::AUTH_ERROR, e.to_string())
            }
            ServerError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_codes::INTERNAL_ERROR,
                msg.clone(),
            ),
        };

        let body = json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        });

        (status, Json(body)).into_response()
    }
}

/// Result type alias for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
