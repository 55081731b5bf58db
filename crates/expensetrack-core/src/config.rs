//! Application configuration management.
//!
//! Configuration is stored at `~/.config/expensetrack/config.json`.
//! `EXPENSETRACK_API_URL` and `EXPENSETRACK_TIMEOUT_MS` override the file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::api::{GatewayConfig, DEFAULT_TIMEOUT_MS};
use crate::auth::{FileSessionStore, KeychainSessionStore, SessionStore};

/// Application name used for config/cache directory paths
pub const APP_NAME: &str = "expensetrack";

/// Config file name
const CONFIG_FILE: &str = "config.json";

const DEFAULT_API_URL: &str = "http://localhost:3000";

pub const ENV_API_URL: &str = "EXPENSETRACK_API_URL";
pub const ENV_TIMEOUT_MS: &str = "EXPENSETRACK_TIMEOUT_MS";

/// `<cache_dir>/expensetrack`; holds the session file and the log file.
pub fn app_cache_dir() -> Result<PathBuf> {
    let cache_dir = dirs::cache_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
    Ok(cache_dir.join(APP_NAME))
}

/// Where the session is persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    #[default]
    File,
    Keychain,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub request_timeout_ms: u64,
    pub session_backend: SessionBackend,
    pub last_email: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            request_timeout_ms: DEFAULT_TIMEOUT_MS,
            session_backend: SessionBackend::default(),
            last_email: None,
        }
    }
}

impl Config {
    /// Load from the default location and apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let mut config: Self = serde_json::from_str(&contents)
                .with_context(|| format!("Invalid config file {}", path.display()))?;
            if config.request_timeout_ms == 0 {
                warn!(path = %path.display(), "Ignoring request_timeout_ms of 0");
                config.request_timeout_ms = DEFAULT_TIMEOUT_MS;
            }
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var(ENV_API_URL).filter(|u| !u.trim().is_empty()) {
            self.api_base_url = url.trim().to_string();
        }
        if let Some(raw) = var(ENV_TIMEOUT_MS) {
            match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => self.request_timeout_ms = ms,
                _ => warn!(value = %raw, "Ignoring invalid {}", ENV_TIMEOUT_MS),
            }
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        app_cache_dir()
    }

    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig::new(self.api_base_url.clone(), self.request_timeout_ms)
    }

    /// Open the configured session backend.
    pub fn open_session_store(&self) -> Result<Arc<dyn SessionStore>> {
        Ok(match self.session_backend {
            SessionBackend::File => Arc::new(FileSessionStore::new(&self.cache_dir()?)),
            SessionBackend::Keychain => Arc::new(KeychainSessionStore::default()),
        })
    }
}
