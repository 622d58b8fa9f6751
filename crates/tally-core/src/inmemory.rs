//! Deterministic in-memory key-value store.
//!
//! Keeps revisions the way an etcd-style store does: one global revision that
//! advances on every applied mutation, and per-key `version`,
//! `create_revision` and `mod_revision` metadata. Every write is applied under
//! a single lock, so transactions are atomic with respect to each other.
//!
//! The store can be switched into an unavailable mode to exercise transport
//! failure paths in callers.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use tally_kv_types::CompareTarget;
use tally_kv_types::KeyValueStoreError;
use tally_kv_types::KeyValueWithRevision;
use tally_kv_types::ReadRequest;
use tally_kv_types::ReadResult;
use tally_kv_types::TxnCompare;
use tally_kv_types::TxnOp;
use tally_kv_types::TxnOpResult;
use tally_kv_types::WriteCommand;
use tally_kv_types::WriteRequest;
use tally_kv_types::WriteResult;
use tokio::sync::RwLock;
use tracing::trace;

use crate::constants::MAX_KEY_SIZE;
use crate::constants::MAX_VALUE_SIZE;
use crate::traits::KeyValueStore;

/// Versioned value for tracking revisions.
#[derive(Clone)]
struct VersionedValue {
    value: String,
    version: u64,
    create_revision: u64,
    mod_revision: u64,
}

#[derive(Default)]
struct KvState {
    data: BTreeMap<String, VersionedValue>,
    /// Global revision counter.
    revision: u64,
}

impl KvState {
    fn put(&mut self, key: &str, value: &str) -> u64 {
        self.revision += 1;
        let revision = self.revision;
        match self.data.get_mut(key) {
            Some(existing) => {
                existing.value = value.to_string();
                existing.version += 1;
                existing.mod_revision = revision;
            }
            None => {
                self.data.insert(key.to_string(), VersionedValue {
                    value: value.to_string(),
                    version: 1,
                    create_revision: revision,
                    mod_revision: revision,
                });
            }
        }
        revision
    }

    fn get(&self, key: &str) -> Option<KeyValueWithRevision> {
        self.data.get(key).map(|v| KeyValueWithRevision {
            key: key.to_string(),
            value: v.value.clone(),
            version: v.version,
            create_revision: v.create_revision,
            mod_revision: v.mod_revision,
        })
    }

    fn compare_holds(&self, cmp: &TxnCompare) -> bool {
        let actual = self.data.get(&cmp.key).map_or(0, |v| match cmp.target {
            CompareTarget::Version => v.version,
            CompareTarget::ModRevision => v.mod_revision,
        });
        actual == cmp.value
    }
}

fn validate_key(key: &str) -> Result<(), KeyValueStoreError> {
    if key.is_empty() {
        return Err(KeyValueStoreError::EmptyKey);
    }
    if key.len() > MAX_KEY_SIZE {
        return Err(KeyValueStoreError::KeyTooLarge {
            size: key.len(),
            max: MAX_KEY_SIZE,
        });
    }
    Ok(())
}

fn validate_value(value: &str) -> Result<(), KeyValueStoreError> {
    if value.len() > MAX_VALUE_SIZE {
        return Err(KeyValueStoreError::ValueTooLarge {
            size: value.len(),
            max: MAX_VALUE_SIZE,
        });
    }
    Ok(())
}

/// A deterministic in-memory key-value store.
///
/// Thread-safe; share it between tasks with `Arc`.
pub struct DeterministicKeyValueStore {
    state: RwLock<KvState>,
    is_unavailable: AtomicBool,
}

impl Default for DeterministicKeyValueStore {
    fn default() -> Self {
        Self::new_inner()
    }
}

impl DeterministicKeyValueStore {
    /// Create a new deterministic store wrapped in Arc.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::new_inner())
    }

    fn new_inner() -> Self {
        Self {
            state: RwLock::new(KvState::default()),
            is_unavailable: AtomicBool::new(false),
        }
    }

    /// Make every subsequent request fail with [`KeyValueStoreError::Unavailable`].
    pub fn set_unavailable(&self, is_unavailable: bool) {
        self.is_unavailable.store(is_unavailable, Ordering::SeqCst);
    }

    /// Current global revision.
    pub async fn current_revision(&self) -> u64 {
        self.state.read().await.revision
    }

    fn check_available(&self) -> Result<(), KeyValueStoreError> {
        if self.is_unavailable.load(Ordering::SeqCst) {
            return Err(KeyValueStoreError::Unavailable {
                reason: "in-memory store marked unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for DeterministicKeyValueStore {
    async fn read(&self, request: ReadRequest) -> Result<ReadResult, KeyValueStoreError> {
        self.check_available()?;
        validate_key(&request.key)?;
        let state = self.state.read().await;
        Ok(ReadResult {
            kv: state.get(&request.key),
        })
    }

    async fn write(&self, request: WriteRequest) -> Result<WriteResult, KeyValueStoreError> {
        self.check_available()?;
        let mut state = self.state.write().await;

        match request.command {
            WriteCommand::Set { key, value } => {
                validate_key(&key)?;
                validate_value(&value)?;
                let revision = state.put(&key, &value);
                Ok(WriteResult {
                    succeeded: Some(true),
                    header_revision: Some(revision),
                    ..Default::default()
                })
            }
            WriteCommand::Transaction { compare, success } => {
                for cmp in &compare {
                    validate_key(&cmp.key)?;
                }
                for TxnOp::Put { key, value } in &success {
                    validate_key(key)?;
                    validate_value(value)?;
                }

                if !compare.iter().all(|cmp| state.compare_holds(cmp)) {
                    trace!(revision = state.revision, "transaction comparison failed");
                    return Ok(WriteResult {
                        succeeded: Some(false),
                        txn_results: None,
                        header_revision: Some(state.revision),
                    });
                }

                let results: Vec<TxnOpResult> = success
                    .into_iter()
                    .map(|TxnOp::Put { key, value }| TxnOpResult::Put {
                        revision: state.put(&key, &value),
                    })
                    .collect();

                trace!(revision = state.revision, "transaction applied");
                Ok(WriteResult {
                    succeeded: Some(true),
                    txn_results: Some(results),
                    header_revision: Some(state.revision),
                })
            }
        }
    }
}
