//! Application state

use std::sync::Arc;

use auth::{IdentitySession, MemoryAuthStateStore, OidcAuth, OidcProviderMetadata};
use cellar_core::CellarSync;
use cellar_store::{CellarStore, MemoryCellarStore, SqliteCellarStore};
use sommelier::SommelierClient;

use crate::config::{ServerConfig, StoreBackend};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Wine record store
    pub store: Arc<dyn CellarStore>,

    /// Live mirror of the signed-in identity's cellar
    pub sync: CellarSync,

    /// Current-identity session
    pub session: IdentitySession,

    /// OIDC client (None in setup mode)
    pub oidc: Option<Arc<OidcAuth>>,

    /// Pending login states for the OIDC round trip
    pub auth_states: Arc<MemoryAuthStateStore>,

    /// AI sommelier client (None when no API key is configured)
    pub sommelier: Option<Arc<SommelierClient>>,

    /// Outbound HTTP client for token exchange and userinfo
    pub http: reqwest::Client,

    /// Server configuration
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Create a new application state
    pub async fn new(config: ServerConfig) -> Result<Self, StateError> {
        let store: Arc<dyn CellarStore> = match config.store_backend {
            StoreBackend::Sqlite => {
                let store = SqliteCellarStore::open(&config.database_path)
                    .await
                    .map_err(|e| StateError::Database(e.to_string()))?;
                tracing::info!(path = %config.database_path.display(), "SQLite cellar opened");
                Arc::new(store)
            }
            StoreBackend::Memory => {
                tracing::info!("In-memory cellar store; records are lost on restart");
                Arc::new(MemoryCellarStore::new())
            }
        };

        let oidc = match config.oidc.as_ref() {
            Some(oidc_config) => {
                let mut oidc_auth = OidcAuth::new(oidc_config.clone());
                match discover_oidc_metadata(&oidc_auth).await {
                    Ok(metadata) => {
                        tracing::info!(issuer = %metadata.issuer, "OIDC provider metadata discovered");
                        oidc_auth = oidc_auth.with_metadata(metadata);
                    }
                    Err(e) => {
                        tracing::warn!(
                            error = %e,
                            "Failed to discover OIDC metadata, sign-in may not work"
                        );
                    }
                }
                Some(Arc::new(oidc_auth))
            }
            None => {
                tracing::warn!("No OIDC configuration, starting in setup mode");
                None
            }
        };

        let sommelier = match config.ai.as_ref() {
            Some(ai_config) => {
                let client = SommelierClient::new(ai_config.clone())
                    .map_err(|e| StateError::Sommelier(e.to_string()))?;
                tracing::info!(model = %ai_config.model, "AI sommelier enabled");
                Some(Arc::new(client))
            }
            None => {
                tracing::info!("No AI configuration, sommelier endpoints disabled");
                None
            }
        };

        Ok(Self {
            sync: CellarSync::new(store.clone()),
            store,
            session: IdentitySession::new(),
            oidc,
            auth_states: Arc::new(MemoryAuthStateStore::new()),
            sommelier,
            http: reqwest::Client::new(),
            config: Arc::new(config),
        })
    }

    /// True while the server runs behind the setup prompt
    pub fn setup_mode(&self) -> bool {
        self.oidc.is_none()
    }
}

/// Discover OIDC provider metadata
async fn discover_oidc_metadata(
    oidc: &OidcAuth,
) -> Result<OidcProviderMetadata, Box<dyn std::error::Error + Send + Sync>> {
    let discovery_url = oidc.discovery_url();
    let client = reqwest::Client::new();

    let response = client.get(&discovery_url).send().await?;

    if !response.status().is_success() {
        return Err(format!("OIDC discovery failed with status: {}", response.status()).into());
    }

    let metadata: OidcProviderMetadata = response.json().await?;
    Ok(metadata)
}

/// State initialization errors
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("Failed to initialize database: {0}")]
    Database(String),

    #[error("Failed to initialize sommelier client: {0}")]
    Sommelier(String),
}
