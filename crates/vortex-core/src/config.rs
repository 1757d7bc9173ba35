//! Application configuration management.
//!
//! This module handles loading and saving the application configuration:
//! backend URL, session storage backend, request timeout and the last used
//! username.
//!
//! Configuration is stored at `~/.config/vortex-hr/config.json`.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::client::DEFAULT_TIMEOUT_SECS;
use crate::storage::{FileStore, KeyValueStore, KeyringStore, MemoryStore};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "vortex-hr";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";

/// Environment variable overriding the backend URL
pub const API_URL_ENV: &str = "VORTEX_API_URL";

/// Environment variable pre-filling the login username
pub const USERNAME_ENV: &str = "VORTEX_USERNAME";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    File,
    Keyring,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub storage: StorageBackend,
    pub request_timeout_secs: Option<u64>,
    pub last_username: Option<String>,
    /// Backend URL given on the command line; wins over everything else.
    #[serde(skip)]
    pub api_url_override: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            Ok(serde_json::from_str(&contents).context("Failed to parse config file")?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Backend URL: command line, environment, config file, then the local
    /// default.
    pub fn api_base_url(&self) -> String {
        self.resolve_api_base_url(std::env::var(API_URL_ENV).ok())
    }

    fn resolve_api_base_url(&self, from_env: Option<String>) -> String {
        self.api_url_override
            .clone()
            .or(from_env)
            .filter(|u| !u.trim().is_empty())
            .or_else(|| self.api_base_url.clone())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
    }

    /// Username to pre-fill on the login prompt.
    pub fn default_username(&self) -> Option<String> {
        std::env::var(USERNAME_ENV)
            .ok()
            .filter(|u| !u.is_empty())
            .or_else(|| self.last_username.clone())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    /// Directory-safe name of the backend origin, e.g.
    /// `http://localhost:8000/api` becomes `localhost_8000`.
    ///
    /// Sessions are scoped per origin so two backends never share tokens.
    pub fn origin_key(&self) -> String {
        origin_key(&self.api_base_url())
    }

    /// Where the file backend keeps this origin's session.
    pub fn session_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME).join(self.origin_key()))
    }

    pub fn log_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME).join("logs"))
    }

    /// Open the configured session storage backend.
    pub fn open_store(&self) -> Result<Box<dyn KeyValueStore>> {
        Ok(match self.storage {
            StorageBackend::File => Box::new(FileStore::in_dir(self.session_dir()?)),
            StorageBackend::Keyring => {
                Box::new(KeyringStore::new(format!("{}:{}", APP_NAME, self.origin_key())))
            }
            StorageBackend::Memory => Box::new(MemoryStore::new()),
        })
    }
}

fn origin_key(url: &str) -> String {
    let without_scheme = url.split("://").nth(1).unwrap_or(url);
    let origin = without_scheme.split('/').next().unwrap_or_default();
    let key: String = origin
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
        .collect();
    if key.is_empty() {
        "default".to_string()
    } else {
        key
    }
}
