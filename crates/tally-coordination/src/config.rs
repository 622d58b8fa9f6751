//! Semaphore configuration.
//!
//! Loaded from TOML or built in code; every field has a default.
//!
//! ```toml
//! key_prefix = "locks/"
//! operation_timeout_ms = 5000
//!
//! [retry]
//! max_attempts = 20
//! initial_backoff_ms = 5
//! max_backoff_ms = 500
//! ```

use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use tally_core::CAS_RETRY_INITIAL_BACKOFF_MS;
use tally_core::CAS_RETRY_MAX_BACKOFF_MS;
use tally_core::MAX_CAS_RETRIES;

use crate::error::CoordinationError;
use crate::verified::SEMAPHORE_PREFIX;

/// Default values for configuration
mod defaults {
    use super::*;

    pub fn key_prefix() -> String {
        SEMAPHORE_PREFIX.to_string()
    }
    pub fn max_attempts() -> u32 {
        MAX_CAS_RETRIES
    }
    pub fn initial_backoff_ms() -> u64 {
        CAS_RETRY_INITIAL_BACKOFF_MS
    }
    pub fn max_backoff_ms() -> u64 {
        CAS_RETRY_MAX_BACKOFF_MS
    }
}

/// Configuration for semaphore stores and lock handles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SemaphoreConfig {
    /// Prefix prepended to the semaphore name to form its store key.
    #[serde(default = "defaults::key_prefix")]
    pub key_prefix: String,
    /// Deadline applied to each lock-handle operation. `None` waits forever.
    #[serde(default)]
    pub operation_timeout_ms: Option<u64>,
    /// Backoff used by [`crate::retry_on_conflict`].
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for SemaphoreConfig {
    fn default() -> Self {
        Self {
            key_prefix: defaults::key_prefix(),
            operation_timeout_ms: None,
            retry: RetryConfig::default(),
        }
    }
}

impl SemaphoreConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(input: &str) -> Result<Self, CoordinationError> {
        let config: Self = toml::from_str(input).map_err(|source| CoordinationError::ConfigParse { source })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no store or handle can work with.
    pub fn validate(&self) -> Result<(), CoordinationError> {
        if self.key_prefix.is_empty() {
            return Err(CoordinationError::InvalidConfig {
                reason: "key_prefix must not be empty".to_string(),
            });
        }
        if self.operation_timeout_ms == Some(0) {
            return Err(CoordinationError::InvalidConfig {
                reason: "operation_timeout_ms must be positive".to_string(),
            });
        }
        self.retry.validate()
    }

    /// Per-operation deadline, if any.
    pub fn operation_timeout(&self) -> Option<Duration> {
        self.operation_timeout_ms.map(Duration::from_millis)
    }
}

/// Exponential backoff for caller-side conflict retries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    /// Total attempts, including the first.
    #[serde(default = "defaults::max_attempts")]
    pub max_attempts: u32,
    /// Sleep after the first conflict.
    #[serde(default = "defaults::initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    /// Cap for the doubled sleep.
    #[serde(default = "defaults::max_backoff_ms")]
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: defaults::max_attempts(),
            initial_backoff_ms: defaults::initial_backoff_ms(),
            max_backoff_ms: defaults::max_backoff_ms(),
        }
    }
}

impl RetryConfig {
    /// Reject a zero attempt budget or a starting backoff above the cap.
    pub fn validate(&self) -> Result<(), CoordinationError> {
        if self.max_attempts == 0 {
            return Err(CoordinationError::InvalidConfig {
                reason: "retry.max_attempts must be positive".to_string(),
            });
        }
        if self.initial_backoff_ms > self.max_backoff_ms {
            return Err(CoordinationError::InvalidConfig {
                reason: format!(
                    "retry.initial_backoff_ms ({}) exceeds retry.max_backoff_ms ({})",
                    self.initial_backoff_ms, self.max_backoff_ms
                ),
            });
        }
        Ok(())
    }
}
