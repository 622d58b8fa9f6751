//! Write operation types for modifying key-value state.

use serde::Deserialize;
use serde::Serialize;

use crate::transaction::TxnCompare;
use crate::transaction::TxnOp;
use crate::transaction::TxnOpResult;

/// Commands for modifying key-value state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum WriteCommand {
    /// Set a single key-value pair.
    Set { key: String, value: String },
    /// Transaction: apply `success` atomically if every comparison holds,
    /// otherwise apply nothing.
    Transaction {
        compare: Vec<TxnCompare>,
        success: Vec<TxnOp>,
    },
}

/// Request to perform a write operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WriteRequest {
    pub command: WriteCommand,
}

impl WriteRequest {
    /// Create a Set command to store a key-value pair.
    pub fn set(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            command: WriteCommand::Set {
                key: key.into(),
                value: value.into(),
            },
        }
    }

    /// Create a transaction that only applies `success` when every comparison holds.
    pub fn transaction(compare: Vec<TxnCompare>, success: Vec<TxnOp>) -> Self {
        Self {
            command: WriteCommand::Transaction { compare, success },
        }
    }
}

/// Result of a write operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct WriteResult {
    /// For transactions: whether the comparisons held and `success` ran.
    pub succeeded: Option<bool>,
    /// Per-op results when the transaction succeeded.
    pub txn_results: Option<Vec<TxnOpResult>>,
    /// Store revision after the write.
    pub header_revision: Option<u64>,
}
