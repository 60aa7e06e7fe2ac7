//! Authorization state storage
//!
//! This module stores pending OIDC authorization state between the redirect
//! to the provider and the callback. One process serves one cellar, so the
//! in-memory backend is the only one provided.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::{AuthError, AuthResult, AuthorizationState};

/// Trait for authorization state storage
#[async_trait]
pub trait AuthStateStore: Send + Sync {
    /// Store an authorization state
    async fn store(&self, state: &AuthorizationState) -> AuthResult<()>;

    /// Retrieve and remove an authorization state by state token
    ///
    /// This is an atomic operation - the state is removed upon retrieval
    /// to prevent replay attacks.
    async fn take(&self, state_token: &str) -> AuthResult<Option<AuthorizationState>>;

    /// Remove expired states (cleanup task)
    ///
    /// Returns the number of states removed.
    async fn cleanup_expired(&self, max_age_secs: i64) -> AuthResult<usize>;
}

/// In-memory authorization state store
#[derive(Debug, Default)]
pub struct MemoryAuthStateStore {
    states: RwLock<HashMap<String, AuthorizationState>>,
}

impl MemoryAuthStateStore {
    /// Create a new in-memory store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuthStateStore for MemoryAuthStateStore {
    async fn store(&self, state: &AuthorizationState) -> AuthResult<()> {
        let mut states = self
            .states
            .write()
            .map_err(|e| AuthError::Oidc(format!("Lock poisoned: {}", e)))?;
        states.insert(state.state.clone(), state.clone());
        Ok(())
    }

    async fn take(&self, state_token: &str) -> AuthResult<Option<AuthorizationState>> {
        let mut states = self
            .states
            .write()
            .map_err(|e| AuthError::Oidc(format!("Lock poisoned: {}", e)))?;
        Ok(states.remove(state_token))
    }

    async fn cleanup_expired(&self, max_age_secs: i64) -> AuthResult<usize> {
        let mut states = self
            .states
            .write()
            .map_err(|e| AuthError::Oidc(format!("Lock poisoned: {}", e)))?;
        let before_count = states.len();
        states.retain(|_, state| !state.is_expired(max_age_secs));
        Ok(before_count - states.len())
    }
}
