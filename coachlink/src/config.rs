//! Configuration loading.
//!
//! Priority order: environment variables, then `~/.config/coachlink/config.toml`,
//! then defaults. Absent platform credentials are not an error — they select
//! the null session backend and null push client at startup.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Default base URL for the communications platform.
const DEFAULT_PLATFORM_URL: &str = "https://rooms.example-comms.io/v1";

/// Communications platform credentials and endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Platform API base URL.
    pub base_url: String,
    /// API key; absent in demo mode.
    pub api_key: Option<String>,
    /// API token; absent in demo mode.
    pub api_token: Option<String>,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_PLATFORM_URL.to_string(),
            api_key: None,
            api_token: None,
        }
    }
}

impl PlatformConfig {
    /// Whether real platform credentials are present.
    pub const fn is_configured(&self) -> bool {
        self.api_key.is_some() && self.api_token.is_some()
    }
}

/// Push delivery collaborator endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PushConfig {
    /// Where notifications are forwarded; absent in demo mode.
    pub endpoint: Option<String>,
}

/// Full coachlink configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub platform: PlatformConfig,
    pub push: PushConfig,
    /// Override for the database path.
    pub database_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration: env vars over config file over defaults.
    pub fn load() -> Result<Self> {
        let mut config = Self::from_file()?.unwrap_or_default();

        if let Ok(url) = std::env::var("COACHLINK_PLATFORM_URL") {
            config.platform.base_url = url;
        }
        if let Ok(key) = std::env::var("COACHLINK_PLATFORM_KEY") {
            config.platform.api_key = Some(key);
        }
        if let Ok(token) = std::env::var("COACHLINK_PLATFORM_TOKEN") {
            config.platform.api_token = Some(token);
        }
        if let Ok(endpoint) = std::env::var("COACHLINK_PUSH_ENDPOINT") {
            config.push.endpoint = Some(endpoint);
        }
        if let Ok(path) = std::env::var("COACHLINK_DB_PATH") {
            config.database_path = Some(PathBuf::from(path));
        }

        Ok(config)
    }

    /// Read the config file if one exists.
    fn from_file() -> Result<Option<Self>> {
        let Some(path) = Self::config_file_path() else {
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(Some(config))
    }

    fn config_file_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("coachlink").join("config.toml"))
    }
}
