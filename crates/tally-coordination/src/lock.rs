//! Per-holder handle over a semaphore store.
//!
//! Every mutating call is one read-modify-write cycle: `get` the record,
//! apply a transition, `set` the result. A transition that fails performs no
//! write. Conflicts reported by the store are returned to the caller as
//! [`CoordinationError::CasConflict`]; re-running the cycle is the caller's
//! decision (see [`crate::retry_on_conflict`]).

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::config::SemaphoreConfig;
use crate::error::CoordinationError;
use crate::semaphore::Semaphore;
use crate::store::SemaphoreStore;

/// Semaphore handle bound to one holder identity and one store.
///
/// Handles for different holders may share a store through `Arc`.
pub struct SemaphoreLock<S: SemaphoreStore + ?Sized> {
    holder_id: String,
    store: Arc<S>,
    timeout: Option<Duration>,
}

impl<S: SemaphoreStore + ?Sized> Clone for SemaphoreLock<S> {
    fn clone(&self) -> Self {
        Self {
            holder_id: self.holder_id.clone(),
            store: Arc::clone(&self.store),
            timeout: self.timeout,
        }
    }
}

impl<S: SemaphoreStore + ?Sized> SemaphoreLock<S> {
    /// Create a handle for `holder_id` with no operation deadline.
    pub fn new(holder_id: impl Into<String>, store: Arc<S>) -> Self {
        Self {
            holder_id: holder_id.into(),
            store,
            timeout: None,
        }
    }

    /// Create a handle using the deadline from `config`.
    pub fn with_config(holder_id: impl Into<String>, store: Arc<S>, config: &SemaphoreConfig) -> Self {
        Self {
            timeout: config.operation_timeout(),
            ..Self::new(holder_id, store)
        }
    }

    /// Bound every operation by `timeout`.
    ///
    /// An operation that runs out of time fails with
    /// [`CoordinationError::Timeout`]; since the store applies each `set`
    /// atomically, it either wrote once or not at all.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Identity this handle locks and unlocks as.
    pub fn holder_id(&self) -> &str {
        &self.holder_id
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Current record.
    pub async fn get(&self) -> Result<Semaphore, CoordinationError> {
        self.with_deadline("semaphore get", self.store.get()).await
    }

    /// Acquire one unit for this holder.
    pub async fn lock(&self) -> Result<(), CoordinationError> {
        let (sem, ()) = self.update("semaphore lock", |sem| sem.lock(&self.holder_id)).await?;
        debug!(holder_id = %self.holder_id, available = sem.available, "semaphore locked");
        Ok(())
    }

    /// Release this holder's unit.
    pub async fn unlock(&self) -> Result<(), CoordinationError> {
        let (sem, ()) = self.update("semaphore unlock", |sem| sem.unlock(&self.holder_id)).await?;
        debug!(holder_id = %self.holder_id, available = sem.available, "semaphore unlocked");
        Ok(())
    }

    /// Set the capacity.
    ///
    /// Returns the stored record and the capacity it replaced.
    pub async fn set_max(&self, capacity: i64) -> Result<(Semaphore, i64), CoordinationError> {
        let (sem, previous) = self.update("semaphore set_max", |sem| Ok(sem.set_max(capacity))).await?;
        debug!(capacity, previous, available = sem.available, "semaphore resized");
        Ok((sem, previous))
    }

    /// One read-modify-write cycle.
    async fn update<F, R>(&self, operation: &str, transition: F) -> Result<(Semaphore, R), CoordinationError>
    where F: FnOnce(&mut Semaphore) -> Result<R, CoordinationError> + Send {
        self.with_deadline(operation, async move {
            let mut sem = self.store.get().await?;
            let output = transition(&mut sem)?;
            let stored = self.store.set(sem).await?;
            Ok((stored, output))
        })
        .await
    }

    async fn with_deadline<T>(
        &self,
        operation: &str,
        fut: impl Future<Output = Result<T, CoordinationError>>,
    ) -> Result<T, CoordinationError> {
        match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, fut).await.map_err(|_| CoordinationError::Timeout {
                operation: operation.to_string(),
            })?,
            None => fut.await,
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::store::MemSemaphoreStore;

    async fn init_store() -> Arc<MemSemaphoreStore> {
        let store = Arc::new(MemSemaphoreStore::new("test"));
        store.init().await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_single_lock() {
        let store = init_store().await;
        let a = SemaphoreLock::new("a", store.clone());

        a.lock().await.unwrap();
        let sem = store.get().await.unwrap();
        assert_eq!(sem.holders, vec!["a"]);
        assert_eq!(sem.available, 0);

        a.unlock().await.unwrap();
        let sem = store.get().await.unwrap();
        assert!(sem.holders.is_empty());
        assert_eq!(sem.available, 1);
    }

    #[tokio::test]
    async fn test_single_deadlock_is_an_error() {
        let store = init_store().await;
        let a = SemaphoreLock::new("a", store);

        a.lock().await.unwrap();
        assert!(matches!(a.lock().await, Err(CoordinationError::AlreadyHeld { .. })));
        a.unlock().await.unwrap();
    }

    #[tokio::test]
    async fn test_same_holder_double_lock_fails_with_spare_capacity() {
        let store = init_store().await;
        let a = SemaphoreLock::new("a", store);
        a.set_max(2).await.unwrap();

        a.lock().await.unwrap();
        assert!(matches!(a.lock().await, Err(CoordinationError::AlreadyHeld { .. })));
    }

    #[tokio::test]
    async fn test_unlock_unheld_fails() {
        let store = init_store().await;
        let a = SemaphoreLock::new("a", store.clone());
        let b = SemaphoreLock::new("b", store);

        assert!(matches!(a.unlock().await, Err(CoordinationError::NotHeld { .. })));
        a.lock().await.unwrap();
        assert!(matches!(b.unlock().await, Err(CoordinationError::NotHeld { .. })));
    }

    #[tokio::test]
    async fn test_second_holder_blocked_at_capacity_one() {
        let store = init_store().await;
        let a = SemaphoreLock::new("a", store.clone());
        let b = SemaphoreLock::new("b", store.clone());

        a.lock().await.unwrap();
        assert!(matches!(b.lock().await, Err(CoordinationError::NoCapacity { available: 0 })));

        let sem = store.get().await.unwrap();
        assert_eq!(sem.holders, vec!["a"]);
        assert_eq!(sem.available, 0);

        a.unlock().await.unwrap();
        let sem = store.get().await.unwrap();
        assert!(sem.holders.is_empty());
        assert_eq!(sem.available, 1);
    }

    #[tokio::test]
    async fn test_two_holders_at_capacity_two() {
        let store = init_store().await;
        let a = SemaphoreLock::new("a", store.clone());
        let b = SemaphoreLock::new("b", store.clone());
        a.set_max(2).await.unwrap();

        a.lock().await.unwrap();
        b.lock().await.unwrap();
        let sem = store.get().await.unwrap();
        assert_eq!(sem.holders, vec!["a", "b"]);
        assert_eq!(sem.available, 0);

        a.unlock().await.unwrap();
        let sem = store.get().await.unwrap();
        assert_eq!(sem.holders, vec!["b"]);
        assert_eq!(sem.available, 1);
    }

    #[tokio::test]
    async fn test_set_max_returns_record_and_previous() {
        let store = init_store().await;
        let a = SemaphoreLock::new("a", store.clone());
        a.lock().await.unwrap();

        let mut expected_previous = 1;
        for max in [3, 2, 1, 0, -1, 0, 1, 2, 3] {
            let (sem, previous) = a.set_max(max).await.unwrap();
            assert_eq!(previous, expected_previous);
            assert_eq!(sem.available, max - 1);
            assert_eq!(store.get().await.unwrap(), sem);
            expected_previous = max;
        }
    }

    #[tokio::test]
    async fn test_failed_transition_does_not_write() {
        let store = init_store().await;
        let a = SemaphoreLock::new("a", store.clone());
        a.lock().await.unwrap();
        let before = store.get().await.unwrap();

        assert!(a.lock().await.is_err());
        assert!(SemaphoreLock::new("b", store.clone()).unlock().await.is_err());

        // Version only moves on a write.
        assert_eq!(store.get().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_get_passes_through() {
        let store = init_store().await;
        let a = SemaphoreLock::new("a", store.clone());
        assert_eq!(a.get().await.unwrap(), store.get().await.unwrap());
        assert_eq!(a.holder_id(), "a");
    }

    #[tokio::test]
    async fn test_uninitialized_store() {
        let store = Arc::new(MemSemaphoreStore::new("empty"));
        let a = SemaphoreLock::new("a", store);
        assert!(matches!(a.lock().await, Err(CoordinationError::NotInitialized { .. })));
    }

    /// Store whose reads never complete.
    struct StalledStore;

    #[async_trait]
    impl SemaphoreStore for StalledStore {
        async fn init(&self) -> Result<(), CoordinationError> {
            Ok(())
        }

        async fn get(&self) -> Result<Semaphore, CoordinationError> {
            std::future::pending().await
        }

        async fn set(&self, _semaphore: Semaphore) -> Result<Semaphore, CoordinationError> {
            unreachable!("set must not be reached without a read")
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout() {
        let a = SemaphoreLock::new("a", Arc::new(StalledStore)).with_timeout(Duration::from_millis(50));
        let err = a.lock().await.unwrap_err();
        assert!(matches!(err, CoordinationError::Timeout { ref operation } if operation == "semaphore lock"));
    }

    /// Store that reads from an inner store but never finishes a write.
    struct StalledWriteStore {
        inner: Arc<MemSemaphoreStore>,
    }

    #[async_trait]
    impl SemaphoreStore for StalledWriteStore {
        async fn init(&self) -> Result<(), CoordinationError> {
            self.inner.init().await
        }

        async fn get(&self) -> Result<Semaphore, CoordinationError> {
            self.inner.get().await
        }

        async fn set(&self, _semaphore: Semaphore) -> Result<Semaphore, CoordinationError> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_during_write_leaves_record_unchanged() {
        let inner = init_store().await;
        let before = inner.get().await.unwrap();
        let store = Arc::new(StalledWriteStore { inner: inner.clone() });
        let a = SemaphoreLock::new("a", store).with_timeout(Duration::from_millis(50));

        let err = a.lock().await.unwrap_err();
        assert!(matches!(err, CoordinationError::Timeout { ref operation } if operation == "semaphore lock"));
        let err = a.set_max(3).await.unwrap_err();
        assert!(matches!(err, CoordinationError::Timeout { .. }));

        assert_eq!(inner.get().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_with_config_applies_timeout() {
        let config = SemaphoreConfig {
            operation_timeout_ms: Some(250),
            ..Default::default()
        };
        let a = SemaphoreLock::with_config("a", init_store().await, &config);
        assert_eq!(a.timeout, Some(Duration::from_millis(250)));
    }
}
