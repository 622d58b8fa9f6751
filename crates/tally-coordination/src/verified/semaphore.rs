//! Pure semaphore computation functions.
//!
//! This module contains pure functions for semaphore transitions.
//! All functions are deterministic and side-effect free.
//!
//! # Tiger Style
//!
//! - Uses saturating arithmetic for all calculations
//! - Holder sets are kept sorted so membership checks are binary searches

/// Default semaphore key prefix.
pub const SEMAPHORE_PREFIX: &str = "__semaphore:";

// ============================================================================
// Key Generation
// ============================================================================

/// Generate the key for a semaphore under `prefix`.
///
/// # Example
///
/// ```ignore
/// assert_eq!(semaphore_key(SEMAPHORE_PREFIX, "my-sem"), "__semaphore:my-sem");
/// ```
#[inline]
pub fn semaphore_key(prefix: &str, name: &str) -> String {
    format!("{}{}", prefix, name)
}

// ============================================================================
// Capacity
// ============================================================================

/// Units left once every holder is accounted for.
///
/// Negative when capacity was reduced below current occupancy.
///
/// # Tiger Style
///
/// - Uses saturating_sub to prevent overflow at the i64 bounds
#[inline]
pub fn compute_available(capacity: i64, holder_count: usize) -> i64 {
    let holders = i64::try_from(holder_count).unwrap_or(i64::MAX);
    capacity.saturating_sub(holders)
}

/// Check if one more unit can be acquired.
#[inline]
pub fn can_acquire(available: i64) -> bool {
    available > 0
}

// ============================================================================
// Holder Set
// ============================================================================

/// Insert `holder_id` at its sorted position.
///
/// Returns `false` and leaves `holders` untouched if it is already present.
pub fn insert_holder(holders: &mut Vec<String>, holder_id: &str) -> bool {
    match holders.binary_search_by(|h| h.as_str().cmp(holder_id)) {
        Ok(_) => false,
        Err(pos) => {
            holders.insert(pos, holder_id.to_string());
            true
        }
    }
}

/// Remove `holder_id`, preserving order.
///
/// Returns `false` if it was not present.
pub fn remove_holder(holders: &mut Vec<String>, holder_id: &str) -> bool {
    match holders.binary_search_by(|h| h.as_str().cmp(holder_id)) {
        Ok(pos) => {
            holders.remove(pos);
            true
        }
        Err(_) => false,
    }
}

/// Strictly ascending, which also rules out duplicates.
#[inline]
pub fn is_sorted_unique(holders: &[String]) -> bool {
    holders.windows(2).all(|w| w[0] < w[1])
}
