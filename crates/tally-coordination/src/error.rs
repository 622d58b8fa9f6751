//! Error types for the semaphore.

use snafu::Snafu;
use tally_core::KeyValueStoreError;

/// Errors from semaphore transitions, stores, and lock handles.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum CoordinationError {
    /// Holder tried to lock a semaphore it already holds.
    #[snafu(display("semaphore already held by '{holder}'"))]
    AlreadyHeld {
        /// The holder that asked to lock again.
        holder: String,
    },

    /// No units left to acquire.
    #[snafu(display("semaphore has no capacity: {available} available"))]
    NoCapacity {
        /// Available count at the time of the attempt (zero or negative).
        available: i64,
    },

    /// Holder tried to unlock a semaphore it does not hold.
    #[snafu(display("semaphore not held by '{holder}'"))]
    NotHeld {
        /// The holder that asked to unlock.
        holder: String,
    },

    /// CAS operation failed, retry may succeed.
    #[snafu(display("CAS conflict, retry needed"))]
    CasConflict,

    /// No semaphore record exists yet.
    #[snafu(display("semaphore '{key}' is not initialized"))]
    NotInitialized {
        /// Key or name of the missing record.
        key: String,
    },

    /// A record handed to a store violates the semaphore invariants.
    #[snafu(display("invalid semaphore record: {reason}"))]
    InvalidRecord {
        /// Which invariant failed.
        reason: String,
    },

    /// Data in storage is corrupted or unparseable.
    #[snafu(display("corrupted data in key '{key}': {reason}"))]
    CorruptedData {
        /// The key with corrupted data.
        key: String,
        /// Description of what went wrong.
        reason: String,
    },

    /// Underlying storage error.
    #[snafu(display("storage error: {source}"))]
    Storage {
        /// The underlying error.
        source: KeyValueStoreError,
    },

    /// JSON serialization error.
    #[snafu(display("serialization error: {source}"))]
    Serialization {
        /// The underlying error.
        source: serde_json::Error,
    },

    /// Operation timed out.
    #[snafu(display("operation timed out: {operation}"))]
    Timeout {
        /// Description of the operation.
        operation: String,
    },

    /// Maximum retries exceeded.
    #[snafu(display("max retries exceeded for {operation}: {attempts} attempts"))]
    MaxRetriesExceeded {
        /// Description of the operation.
        operation: String,
        /// Number of attempts made.
        attempts: u32,
    },

    /// Configuration could not be parsed.
    #[snafu(display("config parse error: {source}"))]
    ConfigParse {
        /// The underlying error.
        source: toml::de::Error,
    },

    /// Configuration parsed but holds unusable values.
    #[snafu(display("invalid config: {reason}"))]
    InvalidConfig {
        /// What is wrong with it.
        reason: String,
    },
}

impl CoordinationError {
    /// Whether re-running the whole operation later may succeed.
    ///
    /// `NoCapacity` clears once another holder unlocks or capacity grows;
    /// `CasConflict` clears on a fresh read; transient storage failures and
    /// timeouts are left to the caller's backoff policy.
    pub fn is_retryable(&self) -> bool {
        match self {
            CoordinationError::NoCapacity { .. } | CoordinationError::CasConflict | CoordinationError::Timeout { .. } => {
                true
            }
            CoordinationError::Storage { source } => source.is_transient(),
            _ => false,
        }
    }
}

impl From<KeyValueStoreError> for CoordinationError {
    fn from(source: KeyValueStoreError) -> Self {
        CoordinationError::Storage { source }
    }
}

impl From<serde_json::Error> for CoordinationError {
    fn from(source: serde_json::Error) -> Self {
        CoordinationError::Serialization { source }
    }
}
