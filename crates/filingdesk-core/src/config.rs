//! Transport configuration.
//!
//! Every field has a default matching the production constants, so an empty
//! (or absent) TOML file yields the standard behaviour.
//!
//! ```toml
//! heartbeat_interval_ms = 25000
//! request_timeout_ms = 30000
//!
//! [reconnect]
//! base_delay_ms = 1000
//! max_delay_ms = 30000
//! auto_reconnect = true
//!
//! [retry]
//! max_retries = 2
//! base_delay_ms = 1000
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backoff::ReconnectPolicy;
use crate::retry::RetryPolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub reconnect: ReconnectPolicy,
    pub retry: RetryPolicy,
    /// Keepalive ping period on an open channel (default 25000).
    pub heartbeat_interval_ms: u64,
    /// Upper bound on a single request attempt (default 30000).
    pub request_timeout_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            reconnect: ReconnectPolicy::default(),
            retry: RetryPolicy::default(),
            heartbeat_interval_ms: 25_000,
            request_timeout_ms: 30_000,
        }
    }
}

impl TransportConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Timer periods and reconnect delays must be non-zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let non_zero = [
            ("heartbeat_interval_ms", self.heartbeat_interval_ms),
            ("request_timeout_ms", self.request_timeout_ms),
            ("reconnect.base_delay_ms", self.reconnect.base_delay_ms),
            ("reconnect.max_delay_ms", self.reconnect.max_delay_ms),
        ];
        for (field, value) in non_zero {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{field} must be greater than 0")));
            }
        }
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
