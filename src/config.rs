use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::constants::{bus, retry, venue};
use crate::error::{BracketError, BracketResult};
use crate::exchange::signing::ApiCredentials;

fn default_base_url() -> String {
    venue::DEFAULT_BASE_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    venue::DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_max_attempts() -> u32 {
    retry::DEFAULT_MAX_ATTEMPTS
}

fn default_backoff_base_ms() -> u64 {
    retry::DEFAULT_BACKOFF_BASE_MS
}

fn default_event_bus_capacity() -> usize {
    bus::DEFAULT_CAPACITY
}

#[derive(Clone, Debug, Deserialize)]
pub struct VenueConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for VenueConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
        }
    }
}

impl RetryConfig {
    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    pub fn validate(&self) -> BracketResult<()> {
        if self.max_attempts == 0 {
            return Err(BracketError::Config(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.max_attempts > retry::MAX_ATTEMPTS_LIMIT {
            return Err(BracketError::Config(format!(
                "retry.max_attempts must be at most {}",
                retry::MAX_ATTEMPTS_LIMIT
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub venue: VenueConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default = "default_event_bus_capacity")]
    pub event_bus_capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            venue: VenueConfig::default(),
            retry: RetryConfig::default(),
            event_bus_capacity: default_event_bus_capacity(),
        }
    }
}

impl AppConfig {
    /// Loads `config.yaml` (or `$BRACKET_CONFIG`). A missing file yields defaults.
    pub fn load() -> BracketResult<Self> {
        let path = env::var("BRACKET_CONFIG").unwrap_or_else(|_| "config.yaml".to_string());
        Self::load_from(&path)
    }

    pub fn load_from(path: impl AsRef<Path>) -> BracketResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .map_err(|e| BracketError::Config(format!("failed to read {}: {}", path.display(), e)))?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> BracketResult<Self> {
        // Strip BOM if present
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: AppConfig = serde_yaml::from_str(content)?;
        config.retry.validate()?;
        Ok(config)
    }
}

/// Reads the API credentials from the environment.
pub fn credentials_from_env() -> BracketResult<ApiCredentials> {
    let read = |key: &str| {
        env::var(key).map_err(|_| BracketError::Config(format!("{} not set", key)))
    };
    Ok(ApiCredentials::new(
        read(venue::ENV_API_KEY)?,
        read(venue::ENV_API_SECRET)?,
        read(venue::ENV_API_PASSPHRASE)?,
    ))
}
