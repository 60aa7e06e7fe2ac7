//! Server configuration

use std::path::PathBuf;

use auth::OidcConfig;
use serde::{Deserialize, Serialize};
use sommelier::SommelierConfig;

/// Which persistence backend holds the cellar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// SQLite database file. The default.
    Sqlite,
    /// In-memory only; the cellar is gone on restart.
    Memory,
}

impl Default for StoreBackend {
    fn default() -> Self {
        Self::Sqlite
    }
}

/// Server configuration
///
/// Loaded once at startup and passed by reference from there; nothing in the
/// process reads configuration from globals afterwards. The identity
/// provider section is the one credential the product cannot run without:
/// when it is missing the server starts in setup mode. A missing AI section
/// only disables the sommelier endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address (e.g., "127.0.0.1:8080")
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Persistence backend for wine records
    #[serde(default)]
    pub store_backend: StoreBackend,

    /// SQLite database path (used with the sqlite backend)
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Whether to enable CORS
    #[serde(default = "default_enable_cors")]
    pub enable_cors: bool,

    /// Allowed CORS origins; empty means any
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// OIDC identity provider configuration (absent: setup mode)
    #[serde(default)]
    pub oidc: Option<OidcConfig>,

    /// AI sommelier configuration (absent: AI features disabled)
    #[serde(default)]
    pub ai: Option<SommelierConfig>,
}

fn default_bind_address() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cantina")
        .join("cantina.db")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_enable_cors() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            store_backend: StoreBackend::default(),
            database_path: default_database_path(),
            log_level: default_log_level(),
            enable_cors: default_enable_cors(),
            cors_origins: Vec::new(),
            oidc: None,
            ai: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment and optional config file
    ///
    /// Precedence: environment variables over the config file over defaults.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        // Merge the config file first, then let the environment win
        if let Some(config_path) = Self::find_config_file() {
            let contents = std::fs::read_to_string(&config_path)?;
            let file_config: ServerConfig = toml::from_str(&contents)?;
            config = file_config;
        }

        if let Ok(addr) = std::env::var("CANTINA_BIND_ADDRESS") {
            config.bind_address = addr;
        }

        if let Ok(backend) = std::env::var("CANTINA_STORE_BACKEND") {
            config.store_backend = match backend.to_lowercase().as_str() {
                "memory" => StoreBackend::Memory,
                _ => StoreBackend::Sqlite,
            };
        }

        if let Ok(path) = std::env::var("CANTINA_DATABASE_PATH") {
            config.database_path = PathBuf::from(path);
        }

        if let Ok(level) = std::env::var("CANTINA_LOG_LEVEL") {
            config.log_level = level;
        }

        if let Ok(val) = std::env::var("CANTINA_ENABLE_CORS") {
            config.enable_cors = val.parse().unwrap_or(true);
        }

        if let Ok(origins) = std::env::var("CANTINA_CORS_ORIGINS") {
            config.cors_origins = origins.split(',').map(|s| s.trim().to_string()).collect();
        }

        // A complete CANTINA_OIDC_* set in the environment overrides the file
        if let Ok(oidc) = OidcConfig::from_env() {
            config.oidc = Some(oidc);
        }

        // The AI key alone is enough to enable the sommelier
        if let Ok(api_key) = std::env::var("CANTINA_AI_API_KEY").or_else(|_| std::env::var("GEMINI_API_KEY")) {
            let mut ai = config
                .ai
                .take()
                .unwrap_or_else(|| SommelierConfig::new(String::new()));
            ai.api_key = api_key;
            config.ai = Some(ai);
        }

        if let Some(ai) = config.ai.as_mut() {
            if let Ok(model) = std::env::var("CANTINA_AI_MODEL") {
                ai.model = model;
            }
            if let Ok(base_url) = std::env::var("CANTINA_AI_BASE_URL") {
                ai.api_base_url = base_url;
            }
        }

        Ok(config)
    }

    /// Find the config file in standard locations
    pub fn find_config_file() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("CANTINA_CONFIG") {
            return Some(PathBuf::from(path));
        }

        let locations = [
            PathBuf::from("cantina.toml"),
            dirs::config_dir()
                .map(|p| p.join("cantina").join("server.toml"))
                .unwrap_or_default(),
        ];

        locations.into_iter().find(|p| p.exists())
    }

    /// Where setup mode persists a freshly entered configuration
    pub fn write_path() -> PathBuf {
        if let Ok(path) = std::env::var("CANTINA_CONFIG") {
            return PathBuf::from(path);
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cantina")
            .join("server.toml")
    }

    /// Persist this configuration as a TOML file
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// True when the server must run behind the setup prompt
    pub fn setup_required(&self) -> bool {
        self.oidc.is_none()
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read or write config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config file: {0}")]
    Serialize(#[from] toml::ser::Error),
}
