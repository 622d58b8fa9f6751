//! Key-value store interface consumed by the coordination primitives.

use async_trait::async_trait;
use tally_kv_types::KeyValueStoreError;
use tally_kv_types::ReadRequest;
use tally_kv_types::ReadResult;
use tally_kv_types::WriteRequest;
use tally_kv_types::WriteResult;

/// Linearizable key-value store interface.
///
/// Implementations must apply each [`WriteRequest`] atomically: a transaction's
/// comparisons and its operations are evaluated against one consistent
/// snapshot, with no other write interleaved.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Apply a write command.
    async fn write(&self, request: WriteRequest) -> Result<WriteResult, KeyValueStoreError>;

    /// Read a value by key with revision metadata.
    async fn read(&self, request: ReadRequest) -> Result<ReadResult, KeyValueStoreError>;
}

// Blanket implementation for Arc<T>
#[async_trait]
impl<T: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<T> {
    async fn write(&self, request: WriteRequest) -> Result<WriteResult, KeyValueStoreError> {
        (**self).write(request).await
    }

    async fn read(&self, request: ReadRequest) -> Result<ReadResult, KeyValueStoreError> {
        (**self).read(request).await
    }
}
