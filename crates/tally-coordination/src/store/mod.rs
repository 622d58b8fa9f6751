//! Storage capability for a single semaphore record.
//!
//! Two conformances ship with the crate:
//!
//! - [`MemSemaphoreStore`]: single-process reference, unconditional overwrite.
//! - [`KvSemaphoreStore`]: any [`tally_core::KeyValueStore`], writes guarded by
//!   a compare-and-swap on the record's version token.

mod kv;
mod memory;

use async_trait::async_trait;
pub use kv::KvSemaphoreStore;
pub use memory::MemSemaphoreStore;

use crate::error::CoordinationError;
use crate::semaphore::Semaphore;

/// Backend holding one semaphore record.
#[async_trait]
pub trait SemaphoreStore: Send + Sync {
    /// Create the starting record if none exists.
    ///
    /// Safe to call on an initialized resource; never resets existing state.
    async fn init(&self) -> Result<(), CoordinationError>;

    /// Snapshot of the current record, including its version token.
    async fn get(&self) -> Result<Semaphore, CoordinationError>;

    /// Persist `semaphore` and return the stored copy with its new version.
    ///
    /// Rejects records that fail [`Semaphore::validate`]. Backends with
    /// concurrent writers must return [`CoordinationError::CasConflict`] when
    /// `semaphore.version` is no longer current.
    async fn set(&self, semaphore: Semaphore) -> Result<Semaphore, CoordinationError>;
}

// Blanket implementation for Arc<T>
#[async_trait]
impl<T: SemaphoreStore + ?Sized> SemaphoreStore for std::sync::Arc<T> {
    async fn init(&self) -> Result<(), CoordinationError> {
        (**self).init().await
    }

    async fn get(&self) -> Result<Semaphore, CoordinationError> {
        (**self).get().await
    }

    async fn set(&self, semaphore: Semaphore) -> Result<Semaphore, CoordinationError> {
        (**self).set(semaphore).await
    }
}
