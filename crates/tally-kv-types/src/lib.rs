//! Key-value operation types for the store seam used by tally.
//!
//! These types describe the small slice of a linearizable key-value store
//! that the coordination primitives depend on: single-key reads with revision
//! metadata, plain writes, and etcd-style transactions guarded by revision
//! comparisons.

mod error;
mod read;
mod transaction;
mod write;

pub use error::KeyValueStoreError;
pub use read::KeyValueWithRevision;
pub use read::ReadRequest;
pub use read::ReadResult;
pub use transaction::CompareTarget;
pub use transaction::TxnCompare;
pub use transaction::TxnOp;
pub use transaction::TxnOpResult;
pub use write::WriteCommand;
pub use write::WriteRequest;
pub use write::WriteResult;
