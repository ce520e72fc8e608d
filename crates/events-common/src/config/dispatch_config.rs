//! Dispatch configuration
//!
//! Loads dispatcher settings from environment variables (and `.env`).

use serde::Deserialize;
use std::env;
use std::time::Duration;

use crate::telemetry::TracingConfig;

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "production" => Some(Self::Production),
            "staging" => Some(Self::Staging),
            "development" => Some(Self::Development),
            _ => None,
        }
    }
}

/// Dispatcher configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DispatchConfig {
    #[serde(default)]
    pub env: Environment,
    /// Skip installing the built-in logging listeners
    #[serde(default)]
    pub disable_default_listeners: bool,
    /// Default for listeners registered without explicit options
    #[serde(default)]
    pub delay_until_ready: bool,
    /// Upper bound for draining in-flight listeners on shutdown
    #[serde(default = "default_drain_timeout_ms")]
    pub drain_timeout_ms: u64,
    /// Default timeout for `wait_for`; `None` waits forever
    #[serde(default)]
    pub wait_timeout_ms: Option<u64>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            env: Environment::default(),
            disable_default_listeners: false,
            delay_until_ready: false,
            drain_timeout_ms: default_drain_timeout_ms(),
            wait_timeout_ms: None,
        }
    }
}

fn default_drain_timeout_ms() -> u64 {
    5000
}

impl DispatchConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if a variable is set to an unparseable value
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = match lookup("APP_ENV") {
            Some(value) => Environment::parse(&value)
                .ok_or(ConfigError::InvalidValue("APP_ENV", value))?,
            None => Environment::default(),
        };

        Ok(Self {
            env,
            disable_default_listeners: parse_bool(&lookup, "DISPATCH_DISABLE_DEFAULT_LISTENERS")?
                .unwrap_or(false),
            delay_until_ready: parse_bool(&lookup, "DISPATCH_DELAY_UNTIL_READY")?.unwrap_or(false),
            drain_timeout_ms: parse_u64(&lookup, "DISPATCH_DRAIN_TIMEOUT_MS")?
                .unwrap_or_else(default_drain_timeout_ms),
            wait_timeout_ms: parse_u64(&lookup, "DISPATCH_WAIT_TIMEOUT_MS")?,
        })
    }

    #[must_use]
    pub fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }

    #[must_use]
    pub fn wait_timeout(&self) -> Option<Duration> {
        self.wait_timeout_ms.map(Duration::from_millis)
    }

    /// Tracing preset matching the environment
    #[must_use]
    pub fn tracing_config(&self) -> TracingConfig {
        TracingConfig::for_environment(self.env)
    }
}

fn parse_bool<F>(lookup: &F, key: &'static str) -> Result<Option<bool>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = lookup(key) else {
        return Ok(None);
    };

    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        _ => Err(ConfigError::InvalidValue(key, value)),
    }
}

fn parse_u64<F>(lookup: &F, key: &'static str) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key, value))
        })
        .transpose()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
