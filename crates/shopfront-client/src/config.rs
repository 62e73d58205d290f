//! # Client Configuration
//!
//! Where the backend lives and how the client talks to it.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     SHOPFRONT_API_BASE_URL=https://pos.example.com/api                 │
//! │     SHOPFRONT_TIMEOUT_SECS=15                                          │
//! │     SHOPFRONT_SESSION_FILE=/var/lib/shopfront/session.json             │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/shopfront/shopfront.toml (Linux)                         │
//! │     ~/Library/Application Support/com.shopfront.shopfront/ (macOS)     │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     http://localhost:8000/api, 30s timeout, in-memory session          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # shopfront.toml
//! base_url = "https://pos.example.com/api"
//! timeout_secs = 30
//! login_path = "/login"
//! logout_path = "/logout"
//! reauth_path = "/reauthenticate"
//! max_reauth_attempts = 0   # 0 = keep re-prompting after a wrong password
//! session_file = "/var/lib/shopfront/session.json"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{ClientError, ClientResult};

pub const ENV_BASE_URL: &str = "SHOPFRONT_API_BASE_URL";
pub const ENV_TIMEOUT_SECS: &str = "SHOPFRONT_TIMEOUT_SECS";
pub const ENV_SESSION_FILE: &str = "SHOPFRONT_SESSION_FILE";

/// REST client configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// API root; endpoint paths are appended to it.
    pub base_url: String,

    /// Per-request timeout (seconds).
    pub timeout_secs: u64,

    /// Login endpoint. Auth failures from it never open a reauth prompt.
    pub login_path: String,

    pub logout_path: String,

    /// Endpoint that exchanges `{ username, password }` for a fresh token.
    pub reauth_path: String,

    /// Wrong passwords tolerated per episode before giving up.
    /// Set to 0 to keep re-prompting until the user cancels.
    pub max_reauth_attempts: u32,

    /// JSON file backing the session store. In-memory when unset.
    pub session_file: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            base_url: "http://localhost:8000/api".to_string(),
            timeout_secs: 30,
            login_path: "/login".to_string(),
            logout_path: "/logout".to_string(),
            reauth_path: "/reauthenticate".to_string(),
            max_reauth_attempts: 0,
            session_file: None,
        }
    }
}

impl ClientConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (shopfront.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ClientResult<Self> {
        let mut config = match config_path.or_else(Self::default_config_path) {
            Some(path) if path.exists() => Self::from_file(&path)?,
            Some(path) => {
                debug!(?path, "Config file not found, using defaults");
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load client config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Reads a TOML config file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> ClientResult<Self> {
        info!(?path, "Loading client config from file");
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ClientError::ConfigLoadFailed(format!("{}: {}", path.display(), e)))?;
        Ok(toml::from_str(&contents)?)
    }

    /// Applies overrides from a variable lookup (the process environment in
    /// [`ClientConfig::load`]).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> ClientResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BASE_URL) {
            debug!(url = %url, "Overriding base URL from environment");
            self.base_url = url;
        }

        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            self.timeout_secs = raw.trim().parse().map_err(|_| {
                ClientError::InvalidConfig(format!(
                    "{} must be a whole number of seconds, got '{}'",
                    ENV_TIMEOUT_SECS, raw
                ))
            })?;
        }

        if let Some(path) = lookup(ENV_SESSION_FILE) {
            self.session_file = if path.trim().is_empty() {
                None
            } else {
                Some(PathBuf::from(path))
            };
        }

        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ClientResult<()> {
        let url = Url::parse(&self.base_url)?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ClientError::InvalidConfig(format!(
                "base_url must start with http:// or https://, got: {}",
                self.base_url
            )));
        }

        if self.timeout_secs == 0 {
            return Err(ClientError::InvalidConfig(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        for (name, path) in [
            ("login_path", &self.login_path),
            ("logout_path", &self.logout_path),
            ("reauth_path", &self.reauth_path),
        ] {
            if !path.starts_with('/') {
                return Err(ClientError::InvalidConfig(format!(
                    "{} must start with '/', got: {}",
                    name, path
                )));
            }
        }

        Ok(())
    }

    /// Full URL of an endpoint path.
    pub fn endpoint_url(&self, path: &str) -> ClientResult<Url> {
        let joined = format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Ok(Url::parse(&joined)?)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "shopfront", "shopfront")
            .map(|dirs| dirs.config_dir().join("shopfront.toml"))
    }
}
