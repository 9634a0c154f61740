//! Connector configuration.
//!
//! Loaded from TOML. Every section is optional and falls back to defaults:
//!
//! ```toml
//! [retry]
//! max_attempts = 5
//! wait_retry_ms = 20
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ClientError, Result};

/// Default number of dial attempts.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default wait between failed attempts, in milliseconds.
pub const DEFAULT_WAIT_RETRY_MS: u64 = 20;

/// Top-level connector configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorConfig {
    #[serde(default)]
    pub retry: RetryPolicy,
}

impl ConnectorConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ClientError::Config(format!("{}: {e}", path.display())))?;
        let config = Self::from_toml(&content)?;
        debug!(path = %path.display(), ?config, "loaded connector config");
        Ok(config)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| ClientError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.retry.validate()
    }
}

/// How many times to dial and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_wait_retry_ms")]
    pub wait_retry_ms: u64,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, wait_retry: Duration) -> Self {
        Self {
            max_attempts,
            wait_retry_ms: u64::try_from(wait_retry.as_millis()).unwrap_or(u64::MAX),
        }
    }

    pub fn wait_retry(&self) -> Duration {
        Duration::from_millis(self.wait_retry_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(ClientError::Config(
                "retry.max_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            wait_retry_ms: DEFAULT_WAIT_RETRY_MS,
        }
    }
}

const fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

const fn default_wait_retry_ms() -> u64 {
    DEFAULT_WAIT_RETRY_MS
}
