//! Persisted configuration entry
//!
//! The only state kept on disk is the server URL and token, stored as JSON
//! under the platform config directory (`~/.config/plex-sdk/entry.json` on
//! Linux).

use crate::error::ConfigError;
use plex_client::normalize_url;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const ENV_SERVER_URL: &str = "PLEX_SERVER_URL";
pub const ENV_TOKEN: &str = "PLEX_TOKEN";
pub const ENV_POLL_INTERVAL: &str = "PLEX_POLL_INTERVAL";

const CONFIG_DIR: &str = "plex-sdk";
const CONFIG_FILE: &str = "entry.json";

/// Server URL and token of one configured server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryConfig {
    pub server_url: String,
    pub token: String,
}

impl EntryConfig {
    pub fn new(server_url: &str, token: &str) -> Self {
        Self {
            server_url: normalize_url(server_url),
            token: token.trim().to_string(),
        }
    }

    /// Build an entry purely from `PLEX_SERVER_URL` and `PLEX_TOKEN`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Replace fields with `PLEX_SERVER_URL` / `PLEX_TOKEN` when set
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server_url.is_empty() {
            return Err(ConfigError::Missing("server_url"));
        }
        if self.token.is_empty() {
            return Err(ConfigError::Missing("token"));
        }
        Ok(())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let server_url = lookup(ENV_SERVER_URL).ok_or(ConfigError::Missing(ENV_SERVER_URL))?;
        let token = lookup(ENV_TOKEN).ok_or(ConfigError::Missing(ENV_TOKEN))?;
        let config = Self::new(&server_url, &token);
        config.validate()?;
        Ok(config)
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(ENV_SERVER_URL) {
            self.server_url = normalize_url(&url);
        }
        if let Some(token) = lookup(ENV_TOKEN) {
            self.token = token.trim().to_string();
        }
        self
    }
}

/// JSON file holding the configured entry
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the platform default location
    pub fn default_location() -> Result<Self, ConfigError> {
        let dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(Self::new(dir.join(CONFIG_DIR).join(CONFIG_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored entry; `Ok(None)` when nothing has been saved yet
    pub fn load(&self) -> Result<Option<EntryConfig>, ConfigError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let config: EntryConfig = serde_json::from_str(&contents)?;
        debug!("Loaded configuration from {}", self.path.display());
        Ok(Some(config))
    }

    pub fn save(&self, config: &EntryConfig) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(config)?)?;
        debug!("Saved configuration to {}", self.path.display());
        Ok(())
    }

    /// Delete the stored entry; returns whether a file was removed
    pub fn remove(&self) -> Result<bool, ConfigError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
