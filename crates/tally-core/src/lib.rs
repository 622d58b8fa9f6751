//! Core traits and types shared by tally crates.
//!
//! # Key Components
//!
//! - **Traits**: [`KeyValueStore`], the only seam to the external store
//! - **Types**: re-exported request/response types from `tally-kv-types`
//! - **Constants**: resource limits and CAS retry defaults
//! - **In-memory store**: [`DeterministicKeyValueStore`] for tests and
//!   single-process deployments

pub mod constants;
pub mod inmemory;
pub mod traits;

pub use constants::CAS_RETRY_INITIAL_BACKOFF_MS;
pub use constants::CAS_RETRY_MAX_BACKOFF_MS;
pub use constants::MAX_CAS_RETRIES;
pub use constants::MAX_KEY_SIZE;
pub use constants::MAX_VALUE_SIZE;
pub use inmemory::DeterministicKeyValueStore;
pub use tally_kv_types::*;
pub use traits::KeyValueStore;
