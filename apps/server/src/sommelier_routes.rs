//! AI sommelier endpoints.
//!
//! Both endpoints take the current draft, ask the model, and return the
//! merged draft. The merge rules differ by path: a label analysis
//! overwrites the draft, a text suggestion only fills what is still empty.
//! On any AI failure the draft comes back from the error path untouched;
//! the client shows the message once and the user keeps typing.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use sommelier::WineDraft;
use tracing::info;

use crate::api::ensure_configured;
use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

/// Request body for the label analysis endpoint.
#[derive(Debug, Deserialize)]
pub struct AnalyzeLabelRequest {
    /// The draft as the user has filled it so far.
    #[serde(default)]
    pub draft: WineDraft,

    /// Base64-encoded label photo.
    pub image_base64: String,

    /// MIME type of the photo, e.g. "image/jpeg".
    #[serde(default = "default_mime_type")]
    pub mime_type: String,
}

fn default_mime_type() -> String {
    "image/jpeg".to_string()
}

/// Request body for the text suggestion endpoint.
#[derive(Debug, Deserialize)]
pub struct SuggestRequest {
    /// The draft as the user has filled it so far. The lookup query is
    /// built from its name and producer.
    pub draft: WineDraft,
}

/// A merged draft, ready to put back into the form.
#[derive(Debug, Serialize)]
pub struct DraftResponse {
    pub draft: WineDraft,
}

/// Extracts wine details from a label photo and merges them into the draft.
///
/// POST /api/sommelier/label
pub async fn analyze_label(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeLabelRequest>,
) -> ServerResult<Json<DraftResponse>> {
    ensure_configured(&state)?;
    let client = state.sommelier.as_ref().ok_or(ServerError::AiUnavailable)?;

    if request.image_base64.is_empty() {
        return Err(ServerError::InvalidRequest("image_base64 must not be empty".to_string()));
    }

    let analysis = client
        .analyze_label(&request.image_base64, &request.mime_type)
        .await?;

    let mut draft = request.draft;
    draft.apply_label_analysis(&analysis);
    info!(name = %draft.name, "Label analysis merged into draft");

    Ok(Json(DraftResponse { draft }))
}

/// Looks up likely details for the drafted wine and fills the empty fields.
///
/// POST /api/sommelier/suggest
pub async fn suggest_details(
    State(state): State<AppState>,
    Json(request): Json<SuggestRequest>,
) -> ServerResult<Json<DraftResponse>> {
    ensure_configured(&state)?;
    let client = state.sommelier.as_ref().ok_or(ServerError::AiUnavailable)?;

    let query = request.draft.suggestion_query().ok_or_else(|| {
        ServerError::InvalidRequest("enter at least the wine name before auto-filling".to_string())
    })?;

    let suggestion = client.suggest_details(&query).await?;

    let mut draft = request.draft;
    draft.apply_suggestion(&suggestion);
    info!(query = %query, "Suggestion merged into draft");

    Ok(Json(DraftResponse { draft }))
}

#[cfg(test)]
mod tests {
    use crate::test_support::configured_state;

    use super::*;

    #[tokio::test]
    async fn test_ai_routes_answer_unavailable_without_key() {
        // configured_state carries no sommelier client
        let state = configured_state().await;

        let result = suggest_details(
            State(state.clone()),
            Json(SuggestRequest {
                draft: WineDraft::new(),
            }),
        )
        .await;
        assert!(matches!(result, Err(ServerError::AiUnavailable)));

        let result = analyze_label(
            State(state),
            Json(AnalyzeLabelRequest {
                draft: WineDraft::new(),
                image_base64: "aGVsbG8=".to_string(),
                mime_type: "image/jpeg".to_string(),
            }),
        )
        .await;
        assert!(matches!(result, Err(ServerError::AiUnavailable)));
    }

    #[tokio::test]
    async fn test_suggest_requires_a_name() {
        let mut state = configured_state().await;
        state.sommelier = Some(std::sync::Arc::new(
            sommelier::SommelierClient::new(sommelier::SommelierConfig::new("key")).unwrap(),
        ));

        let result = suggest_details(
            State(state),
            Json(SuggestRequest {
                draft: WineDraft::new(),
            }),
        )
        .await;
        assert!(matches!(result, Err(ServerError::InvalidRequest(_))));
    }
}
