//! Read operation types.

use serde::Deserialize;
use serde::Serialize;

/// Request to read a single key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReadRequest {
    pub key: String,
}

impl ReadRequest {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

/// Response from a read operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReadResult {
    pub kv: Option<KeyValueWithRevision>,
}

/// Key-value pair with revision metadata for optimistic concurrency control.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeyValueWithRevision {
    /// The key identifying this entry.
    pub key: String,
    /// The stored value.
    pub value: String,
    /// Key-specific version number, incremented on each modification to this key.
    ///
    /// Starts at 1 when the key is first created.
    pub version: u64,
    /// Store revision at which the key was created.
    pub create_revision: u64,
    /// Store revision of the last modification to this key.
    ///
    /// Read this, compute locally, then guard the write with a
    /// `ModRevision == read value` comparison so that concurrent writers are detected.
    pub mod_revision: u64,
}
