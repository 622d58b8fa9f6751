//! Resource limits and retry defaults.
//!
//! Every limit is a fixed upper bound so no request can allocate without bound.

/// Maximum size of a key in bytes.
pub const MAX_KEY_SIZE: usize = 1024;

/// Maximum size of a stored value in bytes (1 MiB).
pub const MAX_VALUE_SIZE: usize = 1024 * 1024;

/// Maximum number of compare-and-swap attempts before giving up.
pub const MAX_CAS_RETRIES: u32 = 100;

/// Initial backoff between CAS attempts.
pub const CAS_RETRY_INITIAL_BACKOFF_MS: u64 = 1;

/// Upper bound for the doubled CAS backoff.
pub const CAS_RETRY_MAX_BACKOFF_MS: u64 = 128;

const _: () = assert!(CAS_RETRY_INITIAL_BACKOFF_MS <= CAS_RETRY_MAX_BACKOFF_MS);
const _: () = assert!(MAX_CAS_RETRIES > 0);
