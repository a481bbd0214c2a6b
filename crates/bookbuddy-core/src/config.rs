//! Application configuration management.
//!
//! This module handles loading the client configuration: the API base
//! endpoint, the web app origin, the production flag and where tokens are
//! kept.
//!
//! Configuration is read from `~/.config/bookbuddy/config.json` and then
//! overridden by `BOOKBUDDY_*` environment variables.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::auth::CookiePolicy;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "bookbuddy";

/// Config file name
const CONFIG_FILE: &str = "config.json";

const DEFAULT_API_URL: &str = "http://localhost:8000";

const DEFAULT_APP_URL: &str = "http://localhost:5173";

/// HTTP request timeout in seconds.
/// Assistant answers are generated by an LLM and can take a while.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Where the token pair is persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenStorage {
    #[default]
    File,
    Keyring,
    Memory,
}

impl std::str::FromStr for TokenStorage {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "file" => Ok(TokenStorage::File),
            "keyring" => Ok(TokenStorage::Keyring),
            "memory" => Ok(TokenStorage::Memory),
            other => Err(anyhow::anyhow!("Unknown token storage: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_url: String,
    pub app_url: String,
    pub production: bool,
    pub request_timeout_secs: u64,
    pub token_storage: TokenStorage,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            app_url: DEFAULT_APP_URL.to_string(),
            production: false,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            token_storage: TokenStorage::default(),
        }
    }
}

impl Config {
    /// Load the config file (if any) and apply environment overrides
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        } else {
            Self::default()
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply `BOOKBUDDY_*` overrides. Malformed values are logged and ignored.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var("BOOKBUDDY_API_URL").filter(|v| !v.is_empty()) {
            self.api_url = url;
        }
        if let Some(url) = var("BOOKBUDDY_APP_URL").filter(|v| !v.is_empty()) {
            self.app_url = url;
        }
        if let Some(flag) = var("BOOKBUDDY_PRODUCTION") {
            self.production = matches!(flag.trim().to_lowercase().as_str(), "1" | "true" | "yes");
        }
        if let Some(secs) = var("BOOKBUDDY_TIMEOUT_SECS") {
            match secs.trim().parse() {
                Ok(secs) => self.request_timeout_secs = secs,
                Err(_) => warn!(value = %secs, "Ignoring invalid BOOKBUDDY_TIMEOUT_SECS"),
            }
        }
        if let Some(storage) = var("BOOKBUDDY_TOKEN_STORAGE") {
            match storage.parse() {
                Ok(storage) => self.token_storage = storage,
                Err(e) => warn!(error = %e, "Ignoring invalid BOOKBUDDY_TOKEN_STORAGE"),
            }
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn cookie_policy(&self) -> CookiePolicy {
        CookiePolicy::for_origin(self.production, &self.app_url)
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }
}
