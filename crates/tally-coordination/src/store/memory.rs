//! In-memory semaphore store.

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::SemaphoreStore;
use crate::error::CoordinationError;
use crate::semaphore::Semaphore;

/// Single-process store keeping the record in memory.
///
/// `set` overwrites unconditionally once the record exists: the version token
/// still advances on every write, but stale writes are not detected. Use it where only one
/// writer exists, or as a test double.
#[derive(Debug)]
pub struct MemSemaphoreStore {
    name: String,
    record: RwLock<Option<Semaphore>>,
}

impl MemSemaphoreStore {
    /// Create an empty store. Call [`SemaphoreStore::init`] before use.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            record: RwLock::new(None),
        }
    }

    /// Name used in errors and logs.
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl SemaphoreStore for MemSemaphoreStore {
    async fn init(&self) -> Result<(), CoordinationError> {
        let mut record = self.record.write().await;
        if record.is_none() {
            *record = Some(Semaphore::new());
            debug!(name = %self.name, "semaphore created");
        }
        Ok(())
    }

    async fn get(&self) -> Result<Semaphore, CoordinationError> {
        self.record.read().await.clone().ok_or_else(|| CoordinationError::NotInitialized {
            key: self.name.clone(),
        })
    }

    async fn set(&self, mut semaphore: Semaphore) -> Result<Semaphore, CoordinationError> {
        semaphore.validate()?;

        let mut record = self.record.write().await;
        let current = record.as_ref().ok_or_else(|| CoordinationError::NotInitialized {
            key: self.name.clone(),
        })?;
        semaphore.version = current.version.saturating_add(1);
        *record = Some(semaphore.clone());

        debug!(
            name = %self.name,
            version = semaphore.version,
            available = semaphore.available,
            "semaphore stored"
        );
        Ok(semaphore)
    }
}
