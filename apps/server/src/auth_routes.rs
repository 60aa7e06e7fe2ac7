//! Authentication route handlers
//!
//! REST endpoints for the sign-in flow:
//! - `/auth/login` - Initiate OIDC login
//! - `/auth/callback` - OIDC callback: token exchange, userinfo, sign-in
//! - `/auth/logout` - Sign the current identity out
//! - `/auth/me` - Get the signed-in identity

use auth::{
    AuthStateStore, AuthorizationState, Identity, TokenResponse, UserInfo,
    DEFAULT_STATE_MAX_AGE_SECS,
};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Redirect,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// URL to redirect to for authentication
    pub auth_url: String,
}

/// Callback query parameters
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    /// Authorization code from the OIDC provider
    #[serde(default)]
    pub code: Option<String>,

    /// State parameter for CSRF protection
    pub state: String,

    /// Optional error from the provider
    #[serde(default)]
    pub error: Option<String>,

    /// Optional error description
    #[serde(default)]
    pub error_description: Option<String>,
}

/// Initiate OIDC login
pub async fn login(State(state): State<AppState>) -> ServerResult<Json<LoginResponse>> {
    let oidc = state.oidc.as_ref().ok_or(ServerError::SetupRequired)?;

    let auth_state = AuthorizationState::new();
    let auth_url = oidc.authorization_url(&auth_state)?;

    state.auth_states.store(&auth_state).await?;

    info!(state = %auth_state.state, "Initiating OIDC login");
    Ok(Json(LoginResponse { auth_url }))
}

/// Handle the OIDC callback: validate state, exchange the code for tokens,
/// fetch userinfo, and sign the identity in. On success the browser is sent
/// back to the application root.
pub async fn callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> ServerResult<Redirect> {
    if let Some(error) = params.error {
        let description = params
            .error_description
            .unwrap_or_else(|| "Authentication failed".to_string());
        warn!(error = %error, description = %description, "OIDC provider returned an error");
        return Err(ServerError::Auth(auth::AuthError::Oidc(description)));
    }

    let oidc = state.oidc.as_ref().ok_or(ServerError::SetupRequired)?;

    let code = params
        .code
        .ok_or_else(|| ServerError::InvalidRequest("missing authorization code".to_string()))?;

    // One-shot take prevents replaying the same state
    let auth_state = state
        .auth_states
        .take(&params.state)
        .await?
        .ok_or_else(|| {
            warn!("Invalid or already used state parameter");
            ServerError::Auth(auth::AuthError::Oidc(
                "Invalid or expired state parameter".to_string(),
            ))
        })?;

    if auth_state.is_expired(DEFAULT_STATE_MAX_AGE_SECS) {
        warn!("Authorization state expired");
        return Err(ServerError::Auth(auth::AuthError::Oidc(
            "Authorization request has expired".to_string(),
        )));
    }

    // Exchange the code for tokens
    let token_endpoint = oidc.token_endpoint()?.to_string();
    let token_params = oidc.token_request_params(&code, &auth_state)?;

    let token_response = state
        .http
        .post(&token_endpoint)
        .form(&token_params)
        .send()
        .await
        .map_err(|e| {
            error!(error = %e, "Token request failed");
            ServerError::Auth(auth::AuthError::Oidc("Token request failed".to_string()))
        })?;

    if !token_response.status().is_success() {
        // The body may carry credentials-adjacent detail, log the status only
        error!(status = %token_response.status(), "Token endpoint returned an error");
        return Err(ServerError::Auth(auth::AuthError::Oidc(
            "Token endpoint returned an error".to_string(),
        )));
    }

    let tokens: TokenResponse = token_response.json().await.map_err(|e| {
        error!(error = %e, "Failed to parse token response");
        ServerError::Auth(auth::AuthError::Oidc("Invalid token response".to_string()))
    })?;

    // Fetch the user's profile
    let userinfo_endpoint = oidc.userinfo_endpoint()?.to_string();
    let userinfo_response = state
        .http
        .get(&userinfo_endpoint)
        .bearer_auth(&tokens.access_token)
        .send()
        .await
        .map_err(|e| {
            error!(error = %e, "Userinfo request failed");
            ServerError::Auth(auth::AuthError::Oidc(
                "Failed to fetch user information".to_string(),
            ))
        })?;

    if !userinfo_response.status().is_success() {
        error!(status = %userinfo_response.status(), "Userinfo endpoint returned an error");
        return Err(ServerError::Auth(auth::AuthError::Oidc(
            "Failed to fetch user information".to_string(),
        )));
    }

    let user_info: UserInfo = userinfo_response.json().await.map_err(|e| {
        error!(error = %e, "Failed to parse userinfo response");
        ServerError::Auth(auth::AuthError::Oidc("Invalid userinfo response".to_string()))
    })?;

    let identity = user_info.to_identity();
    info!(user_id = %identity.id, "Identity authenticated via OIDC");
    state.session.sign_in(identity);

    Ok(Redirect::to("/"))
}

/// Sign the current identity out
pub async fn logout(State(state): State<AppState>) -> StatusCode {
    state.session.sign_out();
    StatusCode::NO_CONTENT
}

/// Get the signed-in identity
pub async fn me(State(state): State<AppState>) -> ServerResult<Json<Identity>> {
    state
        .session
        .current()
        .map(Json)
        .ok_or(ServerError::AuthenticationRequired)
}

#[cfg(test)]
mod tests {
    use crate::test_support::{configured_state, setup_state};

    use super::*;

    #[tokio::test]
    async fn test_login_requires_oidc_configuration() {
        let state = setup_state().await;
        let result = login(State(state)).await;
        assert!(matches!(result, Err(ServerError::SetupRequired)));
    }

    #[tokio::test]
    async fn test_callback_rejects_unknown_state() {
        let state = configured_state().await;
        let params = CallbackParams {
            code: Some("code".to_string()),
            state: "never-stored".to_string(),
            error: None,
            error_description: None,
        };

        let result = callback(State(state), Query(params)).await;
        assert!(matches!(result, Err(ServerError::Auth(_))));
    }

    #[tokio::test]
    async fn test_callback_surfaces_provider_error() {
        let state = configured_state().await;
        let params = CallbackParams {
            code: None,
            state: "irrelevant".to_string(),
            error: Some("access_denied".to_string()),
            error_description: Some("The user declined".to_string()),
        };

        let result = callback(State(state), Query(params)).await;
        assert!(matches!(result, Err(ServerError::Auth(_))));
    }

    #[tokio::test]
    async fn test_me_reflects_session() {
        let state = configured_state().await;
        assert!(me(State(state.clone())).await.is_err());

        state.session.sign_in(Identity::new("user-1").with_name("Ada"));
        let Json(identity) = me(State(state.clone())).await.unwrap();
        assert_eq!(identity.id, "user-1");

        let status = logout(State(state.clone())).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(me(State(state)).await.is_err());
    }
}
