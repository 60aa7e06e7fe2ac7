//! Shared fixtures for handler tests.

use std::sync::Arc;
use std::time::Duration;

use auth::{IdentitySession, MemoryAuthStateStore, OidcAuth, OidcConfig};
use cellar_core::CellarSync;
use cellar_store::{CellarStore, MemoryCellarStore};
use entities::WineRecord;

use crate::config::{ServerConfig, StoreBackend};
use crate::state::AppState;

fn oidc_config() -> OidcConfig {
    OidcConfig::new(
        "https://issuer.test",
        "cantina",
        "secret",
        "http://localhost:8080/auth/callback",
    )
}

/// State as it looks when no identity provider is configured.
pub async fn setup_state() -> AppState {
    let config = ServerConfig {
        store_backend: StoreBackend::Memory,
        ..ServerConfig::default()
    };
    AppState::new(config).await.unwrap()
}

/// Fully configured state over a memory store. OIDC metadata is not
/// discovered; handlers that only need setup mode off work as in production.
pub async fn configured_state() -> AppState {
    let store: Arc<dyn CellarStore> = Arc::new(MemoryCellarStore::new());
    let config = ServerConfig {
        store_backend: StoreBackend::Memory,
        oidc: Some(oidc_config()),
        ..ServerConfig::default()
    };
    AppState {
        sync: CellarSync::new(store.clone()),
        store,
        session: IdentitySession::new(),
        oidc: Some(Arc::new(OidcAuth::new(oidc_config()))),
        auth_states: Arc::new(MemoryAuthStateStore::new()),
        sommelier: None,
        http: reqwest::Client::new(),
        config: Arc::new(config),
    }
}

/// Waits until the mirror satisfies the predicate, panicking after a second.
pub async fn wait_for_mirror(state: &AppState, predicate: impl Fn(&[WineRecord]) -> bool) {
    let mut rx = state.sync.watch();
    tokio::time::timeout(Duration::from_secs(1), async {
        loop {
            if predicate(&rx.borrow_and_update()) {
                return;
            }
            rx.changed().await.unwrap();
        }
    })
    .await
    .expect("mirror did not reach the expected state in time");
}
