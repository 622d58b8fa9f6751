//! Distributed counting semaphore built on compare-and-swap.
//!
//! A semaphore is one record (capacity, available count, sorted holder set,
//! version token) kept in a shared store. Independent processes coordinate
//! through it without a central coordinator:
//!
//! - [`Semaphore`] - the record and its pure `lock` / `unlock` / `set_max` rules
//! - [`SemaphoreStore`] - `init` / `get` / `set` against one record
//! - [`MemSemaphoreStore`] - single-process reference store
//! - [`KvSemaphoreStore`] - store over any [`tally_core::KeyValueStore`], with
//!   writes guarded by the record's revision
//! - [`SemaphoreLock`] - per-holder handle running read-modify-write cycles
//!
//! Exclusivity across processes comes entirely from the store rejecting stale
//! writes. A lost race surfaces as [`CoordinationError::CasConflict`]; wrap the
//! call in [`retry_on_conflict`] to re-run the cycle.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use tally_coordination::{KvSemaphoreStore, SemaphoreLock, SemaphoreStore, retry_on_conflict};
//!
//! let store = Arc::new(KvSemaphoreStore::new(kv, "reboot"));
//! store.init().await?;
//!
//! let lock = SemaphoreLock::new("node-1", store);
//! retry_on_conflict(&config.retry, "lock", || lock.lock()).await?;
//! // ... reboot ...
//! retry_on_conflict(&config.retry, "unlock", || lock.unlock()).await?;
//! ```

mod config;
mod error;
mod lock;
mod retry;
mod semaphore;
mod store;
pub mod verified;

pub use config::RetryConfig;
pub use config::SemaphoreConfig;
pub use error::CoordinationError;
pub use lock::SemaphoreLock;
pub use retry::retry_on_conflict;
pub use semaphore::INITIAL_CAPACITY;
pub use semaphore::Semaphore;
pub use store::KvSemaphoreStore;
pub use store::MemSemaphoreStore;
pub use store::SemaphoreStore;
