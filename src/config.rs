//! Application configuration management.
//!
//! The config file stores the API base URL override and the last email used
//! to log in, at `~/.config/tictac-tui/config.json`. The `TICTAC_API_BASE_URL`
//! environment variable (including via `.env`) takes precedence over the
//! file; tokens are persisted separately under the cache directory.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "tictac-tui";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding the API base URL.
const BASE_URL_ENV: &str = "TICTAC_API_BASE_URL";

/// Base URL used when neither the environment nor the config file sets one.
const DEFAULT_BASE_URL: &str = "http://localhost:3001";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub api_base_url: Option<String>,
    pub last_email: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
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

    /// Resolve the API base URL: environment first, then the config file,
    /// then the local default.
    pub fn base_url(&self) -> String {
        std::env::var(BASE_URL_ENV)
            .ok()
            .filter(|s| !s.is_empty())
            .or_else(|| self.api_base_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory holding the persisted tokens.
    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_file_base_url_used_when_env_unset() {
        let config = Config {
            api_base_url: Some("https://game.example.com/api".to_string()),
            last_email: None,
        };
        // Env var is not set in the test environment
        if std::env::var(BASE_URL_ENV).is_err() {
            assert_eq!(config.base_url(), "https://game.example.com/api");
        }
    }

    #[test]
    fn test_default_base_url() {
        let config = Config::default();
        if std::env::var(BASE_URL_ENV).is_err() {
            assert_eq!(config.base_url(), DEFAULT_BASE_URL);
        }
    }
}
