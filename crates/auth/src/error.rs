//! Authentication error types.

use thiserror::Error;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// OIDC error.
    #[error("OIDC error: {0}")]
    Oidc(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Result type for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;
