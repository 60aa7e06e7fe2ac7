//! Sommelier error types.

use thiserror::Error;

/// Errors that can occur while asking the AI for wine details.
#[derive(Debug, Error)]
pub enum SommelierError {
    /// Request to the generative API failed at the HTTP level.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The API answered but returned no usable candidate text.
    #[error("The model returned an empty response")]
    EmptyResponse,

    /// The candidate text was not the JSON we asked for.
    #[error("Failed to parse model response: {0}")]
    Parse(#[from] serde_json::Error),
}

impl SommelierError {
    /// One-shot message shown to the user when a suggestion fails. The
    /// draft is never touched on failure, so this is all they need to see.
    pub fn user_message(&self) -> String {
        match self {
            SommelierError::Http(_) => {
                "Could not reach the sommelier service. Please try again.".to_string()
            }
            SommelierError::Api { status, .. } => {
                format!("The sommelier service rejected the request (status {status}).")
            }
            SommelierError::EmptyResponse | SommelierError::Parse(_) => {
                "The sommelier could not make sense of that. Please fill the details manually."
                    .to_string()
            }
        }
    }
}

/// Result type for sommelier operations.
pub type SommelierResult<T> = Result<T, SommelierError>;
