//! EventDesk configuration management

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main EventDesk configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventDeskConfig {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Authentication configuration
    #[serde(default)]
    pub auth: AuthConfig,

    /// Storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Search configuration
    #[serde(default)]
    pub search: SearchConfig,

    /// Notification configuration
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

impl EventDeskConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the server cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(Error::Config("server.port must be non-zero".to_string()));
        }
        let radius = self.search.near_radius_meters;
        if radius.is_nan() || radius <= 0.0 {
            return Err(Error::Config(
                "search.near_radius_meters must be positive".to_string(),
            ));
        }
        if self.search.default_per_page == 0 || self.search.max_per_page == 0 {
            return Err(Error::Config("search page sizes must be non-zero".to_string()));
        }
        if self.notifications.timeout_ms == 0 {
            return Err(Error::Config(
                "notifications.timeout_ms must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Allowed CORS origins (empty = any)
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 4000,
            cors_origins: Vec::new(),
        }
    }
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Environment variable holding the JWT signing secret
    pub jwt_secret_env: String,

    /// Expected token issuer
    pub issuer: String,

    /// Lifetime of issued development tokens
    pub token_ttl_hours: i64,

    /// Let admins mutate events they do not own
    pub admin_bypass: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret_env: "EVENTDESK_JWT_SECRET".to_string(),
            issuer: "eventdesk".to_string(),
            token_ttl_hours: 24,
            admin_bypass: true,
        }
    }
}

impl AuthConfig {
    /// Read the signing secret from the configured environment variable
    pub fn resolve_secret(&self) -> Result<String> {
        match std::env::var(&self.jwt_secret_env) {
            Ok(secret) if !secret.is_empty() => Ok(secret),
            _ => Err(Error::Config(format!(
                "JWT secret not set (expected ${})",
                self.jwt_secret_env
            ))),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Base directory for events and users
    pub base_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_dir: dirs_next::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".eventdesk"),
        }
    }
}

impl StorageConfig {
    /// Directory holding one JSON file per event
    pub fn events_dir(&self) -> PathBuf {
        self.base_dir.join("events")
    }

    /// Directory holding one JSON file per user
    pub fn users_dir(&self) -> PathBuf {
        self.base_dir.join("users")
    }
}

/// Search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Radius of the `near` filter in meters
    pub near_radius_meters: f64,

    /// Page size when the client does not ask for one
    pub default_per_page: u64,

    /// Upper bound on the client-requested page size
    pub max_per_page: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            near_radius_meters: 50_000.0,
            default_per_page: 20,
            max_per_page: 100,
        }
    }
}

/// Notification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    /// Send lifecycle notifications at all
    pub enabled: bool,

    /// POST notifications to this URL instead of logging them
    #[serde(default)]
    pub webhook_url: Option<String>,

    /// Per-notification delivery timeout
    pub timeout_ms: u64,

    /// Locale used for subject lines
    pub default_locale: String,

    /// Directory of `<locale>.json` translation catalogues
    #[serde(default)]
    pub locales_dir: Option<PathBuf>,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            webhook_url: None,
            timeout_ms: 5_000,
            default_locale: "en".to_string(),
            locales_dir: None,
        }
    }
}
