//! Pure, deterministic helpers behind the semaphore transitions.
//!
//! Nothing in here touches storage, time, or logging.

pub mod semaphore;

pub use semaphore::SEMAPHORE_PREFIX;
pub use semaphore::can_acquire;
pub use semaphore::compute_available;
pub use semaphore::insert_holder;
pub use semaphore::is_sorted_unique;
pub use semaphore::remove_holder;
pub use semaphore::semaphore_key;
