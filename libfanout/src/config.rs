//! Configuration management for Fanout

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address the HTTP server binds to
    pub bind: String,
    /// Externally reachable base URL, used for the OAuth redirect URI
    pub public_url: String,
    /// Where the OAuth callback sends the operator's browser afterwards
    pub settings_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path of the credential store file (tilde-expanded)
    pub credentials_path: String,
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        Ok(config)
    }

    /// Create a default configuration
    pub fn default_config() -> Self {
        Self {
            server: ServerConfig {
                bind: "127.0.0.1:8787".to_string(),
                public_url: "http://127.0.0.1:8787".to_string(),
                settings_url: "/settings".to_string(),
            },
            store: StoreConfig {
                credentials_path: "~/.config/fanout/credentials.toml".to_string(),
            },
        }
    }

    /// The full redirect URI the LinkedIn consent screen sends the browser
    /// back to.
    pub fn linkedin_redirect_uri(&self) -> String {
        format!(
            "{}/linkedin/callback",
            self.server.public_url.trim_end_matches('/')
        )
    }

    /// Tilde-expanded credential store path.
    pub fn credentials_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.store.credentials_path).to_string())
    }
}

/// Resolve the configuration file path following XDG Base Directory spec
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("FANOUT_CONFIG") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("fanout").join("config.toml"))
}
