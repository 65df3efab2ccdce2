//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use crate::application::errors::ConfigError;

/// Client configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Identity used when a command is not given `--me`
    #[serde(default)]
    pub identity: Option<String>,
    pub store: StoreConfig,
    pub polling: PollingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct StoreConfig {
    pub path: PathBuf,
    /// Keep messages in process memory only
    #[serde(default)]
    pub in_memory: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct PollingConfig {
    pub interval_ms: u64,
    #[serde(default)]
    pub fetch_timeout_ms: Option<u64>,
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn fetch_timeout(&self) -> Option<Duration> {
        self.fetch_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            identity: None,
            store: StoreConfig {
                path: PathBuf::from("blinkchat.db"),
                in_memory: false,
            },
            polling: PollingConfig {
                interval_ms: 5000,
                fetch_timeout_ms: None,
            },
        }
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self)
            .map_err(|e| ConfigError::Parse(format!("Failed to serialize config: {}", e)))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.polling.interval_ms == 0 {
            return Err(ConfigError::InvalidValue("polling.interval-ms must be greater than 0".to_string()));
        }
        if self.polling.fetch_timeout_ms == Some(0) {
            return Err(ConfigError::InvalidValue("polling.fetch-timeout-ms must be greater than 0".to_string()));
        }
        Ok(())
    }

    pub fn load_env() -> Self {
        // Load from environment variables
        let mut config = Config::default();
        config.apply_env();
        config
    }

    /// Override fields from `BLINKCHAT_*` environment variables
    pub fn apply_env(&mut self) {
        if let Ok(path) = std::env::var("BLINKCHAT_DB") {
            self.store.path = PathBuf::from(path);
        }

        if let Ok(identity) = std::env::var("BLINKCHAT_IDENTITY") {
            self.identity = Some(identity);
        }

        if let Ok(interval) = std::env::var("BLINKCHAT_POLL_INTERVAL_MS") {
            match interval.parse::<u64>() {
                Ok(ms) if ms > 0 => self.polling.interval_ms = ms,
                _ => tracing::warn!("Ignoring invalid BLINKCHAT_POLL_INTERVAL_MS: {}", interval),
            }
        }
    }
}
