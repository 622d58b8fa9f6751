//! Semaphore store over a key-value store with revision-guarded writes.
//!
//! The record is stored as a JSON object under one key. Its version token is
//! the key's `mod_revision`; `set` is a transaction that only puts the new
//! value while `mod_revision` still equals the version that was read.

use std::sync::Arc;

use async_trait::async_trait;
use tally_core::KeyValueStore;
use tally_core::ReadRequest;
use tally_core::TxnCompare;
use tally_core::TxnOp;
use tally_core::TxnOpResult;
use tally_core::WriteRequest;
use tally_core::WriteResult;
use tracing::debug;
use tracing::trace;

use super::SemaphoreStore;
use crate::config::SemaphoreConfig;
use crate::error::CoordinationError;
use crate::semaphore::Semaphore;
use crate::verified;

/// Semaphore store backed by any [`KeyValueStore`].
pub struct KvSemaphoreStore<S: KeyValueStore + ?Sized> {
    store: Arc<S>,
    name: String,
    key: String,
}

impl<S: KeyValueStore + ?Sized> KvSemaphoreStore<S> {
    /// Store for semaphore `name` under the default key prefix.
    pub fn new(store: Arc<S>, name: impl Into<String>) -> Self {
        Self::with_config(store, name, &SemaphoreConfig::default())
    }

    /// Store for semaphore `name` under `config.key_prefix`.
    pub fn with_config(store: Arc<S>, name: impl Into<String>, config: &SemaphoreConfig) -> Self {
        let name = name.into();
        let key = verified::semaphore_key(&config.key_prefix, &name);
        Self { store, name, key }
    }

    /// Key the record lives under.
    pub fn key(&self) -> &str {
        &self.key
    }

    fn encode(&self, semaphore: &Semaphore) -> Result<String, CoordinationError> {
        Ok(serde_json::to_string(semaphore)?)
    }

    fn decode(&self, value: &str, version: u64) -> Result<Semaphore, CoordinationError> {
        let mut semaphore: Semaphore = serde_json::from_str(value).map_err(|e| CoordinationError::CorruptedData {
            key: self.key.clone(),
            reason: e.to_string(),
        })?;
        semaphore.validate().map_err(|e| CoordinationError::CorruptedData {
            key: self.key.clone(),
            reason: e.to_string(),
        })?;
        semaphore.version = version;
        Ok(semaphore)
    }

    /// Error for a write whose record was never read from this store.
    async fn unread_write_error(&self) -> CoordinationError {
        match self.store.read(ReadRequest::new(self.key.clone())).await {
            Ok(result) if result.kv.is_none() => CoordinationError::NotInitialized { key: self.key.clone() },
            Ok(_) => CoordinationError::CasConflict,
            Err(e) => e.into(),
        }
    }

    /// Revision assigned to our put, falling back to the header revision.
    fn written_revision(result: &WriteResult) -> Option<u64> {
        result
            .txn_results
            .iter()
            .flatten()
            .find_map(|r| match r {
                TxnOpResult::Put { revision } => Some(*revision),
                _ => None,
            })
            .or(result.header_revision)
    }
}

#[async_trait]
impl<S: KeyValueStore + ?Sized + 'static> SemaphoreStore for KvSemaphoreStore<S> {
    async fn init(&self) -> Result<(), CoordinationError> {
        let value = self.encode(&Semaphore::new())?;
        let result = self
            .store
            .write(WriteRequest::transaction(vec![TxnCompare::key_absent(&self.key)], vec![TxnOp::Put {
                key: self.key.clone(),
                value,
            }]))
            .await?;

        if result.succeeded == Some(true) {
            debug!(name = %self.name, key = %self.key, "semaphore created");
        } else {
            trace!(name = %self.name, key = %self.key, "semaphore already initialized");
        }
        Ok(())
    }

    async fn get(&self) -> Result<Semaphore, CoordinationError> {
        let result = self.store.read(ReadRequest::new(self.key.clone())).await?;
        let kv = result.kv.ok_or_else(|| CoordinationError::NotInitialized { key: self.key.clone() })?;
        trace!(key = %self.key, version = kv.mod_revision, "semaphore read");
        self.decode(&kv.value, kv.mod_revision)
    }

    async fn set(&self, mut semaphore: Semaphore) -> Result<Semaphore, CoordinationError> {
        semaphore.validate()?;
        if semaphore.version == 0 {
            // A zero revision guard would match an absent key and create it.
            return Err(self.unread_write_error().await);
        }
        let value = self.encode(&semaphore)?;

        let result = self
            .store
            .write(WriteRequest::transaction(
                vec![TxnCompare::mod_revision_equals(&self.key, semaphore.version)],
                vec![TxnOp::Put {
                    key: self.key.clone(),
                    value,
                }],
            ))
            .await?;

        if result.succeeded != Some(true) {
            debug!(name = %self.name, version = semaphore.version, "semaphore write lost race");
            return Err(CoordinationError::CasConflict);
        }

        let version = Self::written_revision(&result).ok_or_else(|| CoordinationError::CorruptedData {
            key: self.key.clone(),
            reason: "store reported success without a revision".to_string(),
        })?;
        semaphore.version = version;

        debug!(
            name = %self.name,
            version,
            available = semaphore.available,
            holders = semaphore.holders.len(),
            "semaphore stored"
        );
        Ok(semaphore)
    }
}
