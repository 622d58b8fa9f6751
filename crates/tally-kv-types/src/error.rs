//! Errors returned by key-value store implementations.

use thiserror::Error;

/// Errors returned by the key-value store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum KeyValueStoreError {
    /// Store could not be reached.
    #[error("store unavailable: {reason}")]
    Unavailable {
        /// Description of the transport failure.
        reason: String,
    },

    /// Request did not complete in time.
    #[error("operation timed out after {duration_ms}ms")]
    Timeout {
        /// How long the request waited.
        duration_ms: u64,
    },

    /// Key was empty.
    #[error("key cannot be empty")]
    EmptyKey,

    /// Key exceeded the size limit.
    #[error("key size {size} exceeds maximum of {max} bytes")]
    KeyTooLarge {
        /// Actual key size.
        size: usize,
        /// Maximum allowed.
        max: usize,
    },

    /// Value exceeded the size limit.
    #[error("value size {size} exceeds maximum of {max} bytes")]
    ValueTooLarge {
        /// Actual value size.
        size: usize,
        /// Maximum allowed.
        max: usize,
    },
}

impl KeyValueStoreError {
    /// Whether the failure is transient and the request may be re-sent as-is.
    pub fn is_transient(&self) -> bool {
        matches!(self, KeyValueStoreError::Unavailable { .. } | KeyValueStoreError::Timeout { .. })
    }
}
