//! Transaction types for conditional writes.

use serde::Deserialize;
use serde::Serialize;

/// Revision metadata a transaction condition compares against.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CompareTarget {
    /// Per-key write count; 0 for a key that does not exist.
    Version,
    /// Store revision of the key's last write; 0 for a key that does not exist.
    ModRevision,
}

/// A transaction condition: holds while `target` of `key` equals `value`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TxnCompare {
    pub key: String,
    pub target: CompareTarget,
    pub value: u64,
}

impl TxnCompare {
    /// Condition that holds while `key` is still at `revision`.
    ///
    /// A revision of 0 matches a key that does not exist.
    pub fn mod_revision_equals(key: impl Into<String>, revision: u64) -> Self {
        Self {
            key: key.into(),
            target: CompareTarget::ModRevision,
            value: revision,
        }
    }

    /// Condition that holds only if `key` has never been written.
    pub fn key_absent(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            target: CompareTarget::Version,
            value: 0,
        }
    }
}

/// Operation applied when every condition of a transaction holds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum TxnOp {
    Put { key: String, value: String },
}

/// Result of a single transaction operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum TxnOpResult {
    Put { revision: u64 },
}
