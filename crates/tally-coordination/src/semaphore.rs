//! Semaphore record and its transition rules.
//!
//! A [`Semaphore`] is the whole persisted state of one coordinated resource.
//! The three transitions ([`Semaphore::lock`], [`Semaphore::unlock`],
//! [`Semaphore::set_max`]) are pure: they never touch storage, and a failed
//! transition leaves the record exactly as it was.
//!
//! Invariants after every successful transition:
//!
//! - `available == capacity - holders.len()`
//! - `holders` is strictly ascending (sorted, no duplicates)

use serde::Deserialize;
use serde::Serialize;

use crate::error::CoordinationError;
use crate::verified;

/// Capacity of a freshly initialized semaphore.
pub const INITIAL_CAPACITY: i64 = 1;

/// Semaphore state stored in the key-value store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Semaphore {
    /// Version token assigned by the store on every successful write.
    ///
    /// Not part of the encoded value; stores carry it out of band.
    #[serde(skip)]
    pub version: u64,
    /// Maximum number of simultaneous holders.
    pub capacity: i64,
    /// `capacity - holders.len()`; negative when over-subscribed.
    pub available: i64,
    /// Current holders, ascending.
    #[serde(default)]
    pub holders: Vec<String>,
}

impl Default for Semaphore {
    fn default() -> Self {
        Self::new()
    }
}

impl Semaphore {
    /// The canonical starting record: one unit, no holders.
    pub fn new() -> Self {
        Self {
            version: 0,
            capacity: INITIAL_CAPACITY,
            available: INITIAL_CAPACITY,
            holders: Vec::new(),
        }
    }

    /// Whether `holder_id` currently holds a unit.
    pub fn is_held_by(&self, holder_id: &str) -> bool {
        self.holders.binary_search_by(|h| h.as_str().cmp(holder_id)).is_ok()
    }

    /// Acquire one unit for `holder_id`.
    pub fn lock(&mut self, holder_id: &str) -> Result<(), CoordinationError> {
        if self.is_held_by(holder_id) {
            return Err(CoordinationError::AlreadyHeld {
                holder: holder_id.to_string(),
            });
        }
        if !verified::can_acquire(self.available) {
            return Err(CoordinationError::NoCapacity {
                available: self.available,
            });
        }

        verified::insert_holder(&mut self.holders, holder_id);
        self.available = verified::compute_available(self.capacity, self.holders.len());

        debug_assert!(self.check_invariants().is_ok(), "SEM: lock broke invariants: {:?}", self);
        Ok(())
    }

    /// Release the unit held by `holder_id`.
    pub fn unlock(&mut self, holder_id: &str) -> Result<(), CoordinationError> {
        if !verified::remove_holder(&mut self.holders, holder_id) {
            return Err(CoordinationError::NotHeld {
                holder: holder_id.to_string(),
            });
        }
        // Recomputed rather than incremented so a clamped count at the i64
        // bounds stays consistent with `capacity`.
        self.available = verified::compute_available(self.capacity, self.holders.len());

        debug_assert!(self.check_invariants().is_ok(), "SEM: unlock broke invariants: {:?}", self);
        Ok(())
    }

    /// Resize capacity without touching holders. Returns the previous capacity.
    ///
    /// Any value is accepted. Shrinking below the holder count leaves
    /// `available` negative, and no lock succeeds until enough unlocks bring
    /// it back above zero.
    pub fn set_max(&mut self, capacity: i64) -> i64 {
        let previous = self.capacity;
        self.capacity = capacity;
        self.available = verified::compute_available(capacity, self.holders.len());
        previous
    }

    /// Check the record invariants.
    ///
    /// Stores call this before persisting and after decoding.
    pub fn validate(&self) -> Result<(), CoordinationError> {
        self.check_invariants().map_err(|reason| CoordinationError::InvalidRecord { reason })
    }

    fn check_invariants(&self) -> Result<(), String> {
        if !verified::is_sorted_unique(&self.holders) {
            return Err(format!("holders not sorted and unique: {:?}", self.holders));
        }
        let expected = verified::compute_available(self.capacity, self.holders.len());
        if self.available != expected {
            return Err(format!(
                "available {} does not match capacity {} minus {} holders",
                self.available,
                self.capacity,
                self.holders.len()
            ));
        }
        Ok(())
    }
}
