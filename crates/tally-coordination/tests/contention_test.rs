//! Multi-task contention against a shared key-value store.
//!
//! Each task owns its own store adapter and lock handle, like independent
//! processes sharing only the key-value store.

use std::sync::Arc;

use tally_coordination::CoordinationError;
use tally_coordination::KvSemaphoreStore;
use tally_coordination::RetryConfig;
use tally_coordination::SemaphoreLock;
use tally_coordination::SemaphoreStore;
use tally_coordination::retry_on_conflict;
use tally_core::DeterministicKeyValueStore;
use tokio::task::JoinSet;

const NAME: &str = "contended";

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_env_filter("tally_coordination=debug").with_test_writer().try_init();
}

async fn setup(capacity: i64) -> Arc<DeterministicKeyValueStore> {
    let kv = DeterministicKeyValueStore::new();
    let store = Arc::new(KvSemaphoreStore::new(kv.clone(), NAME));
    store.init().await.unwrap();
    SemaphoreLock::new("admin", store).set_max(capacity).await.unwrap();
    kv
}

fn holder_ids(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("holder{:02}", i)).collect()
}

async fn lock_all(kv: &Arc<DeterministicKeyValueStore>, ids: &[String]) -> Vec<Result<(), CoordinationError>> {
    let mut tasks = JoinSet::new();
    for id in ids {
        let store = Arc::new(KvSemaphoreStore::new(kv.clone(), NAME));
        let lock = SemaphoreLock::new(id.clone(), store);
        tasks.spawn(async move {
            let retry = RetryConfig::default();
            retry_on_conflict(&retry, "lock", || lock.lock()).await
        });
    }

    let mut results = Vec::new();
    while let Some(result) = tasks.join_next().await {
        results.push(result.unwrap());
    }
    results
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_lock_all_succeed_with_enough_capacity() {
    init_tracing();
    let ids = holder_ids(10);
    let kv = setup(ids.len() as i64).await;

    let results = lock_all(&kv, &ids).await;
    assert!(results.iter().all(|r| r.is_ok()), "results: {results:?}");

    let sem = KvSemaphoreStore::new(kv, NAME).get().await.unwrap();
    assert_eq!(sem.holders, ids);
    assert_eq!(sem.available, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_lock_never_exceeds_capacity() {
    init_tracing();
    let ids = holder_ids(12);
    let kv = setup(3).await;

    let results = lock_all(&kv, &ids).await;
    let acquired = results.iter().filter(|r| r.is_ok()).count();
    let refused = results.iter().filter(|r| matches!(r, Err(CoordinationError::NoCapacity { .. }))).count();
    assert_eq!(acquired, 3);
    assert_eq!(refused, ids.len() - 3);

    let sem = KvSemaphoreStore::new(kv, NAME).get().await.unwrap();
    assert_eq!(sem.holders.len(), 3);
    assert_eq!(sem.available, 0);
    assert!(sem.holders.windows(2).all(|w| w[0] < w[1]));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_lock_then_unlock_drains() {
    init_tracing();
    let ids = holder_ids(8);
    let kv = setup(8).await;

    let results = lock_all(&kv, &ids).await;
    assert!(results.iter().all(|r| r.is_ok()));

    let mut tasks = JoinSet::new();
    for id in &ids {
        let lock = SemaphoreLock::new(id.clone(), Arc::new(KvSemaphoreStore::new(kv.clone(), NAME)));
        tasks.spawn(async move { retry_on_conflict(&RetryConfig::default(), "unlock", || lock.unlock()).await });
    }
    while let Some(result) = tasks.join_next().await {
        result.unwrap().unwrap();
    }

    let sem = KvSemaphoreStore::new(kv, NAME).get().await.unwrap();
    assert!(sem.holders.is_empty());
    assert_eq!(sem.available, 8);
}

#[tokio::test]
async fn test_interleaved_cycle_loses_race_without_retry() {
    let kv = setup(2).await;
    let store = KvSemaphoreStore::new(kv.clone(), NAME);

    // Two processes read the same version.
    let mut a_view = store.get().await.unwrap();
    let mut b_view = store.get().await.unwrap();
    a_view.lock("a").unwrap();
    b_view.lock("b").unwrap();

    store.set(a_view).await.unwrap();
    let err = store.set(b_view).await.unwrap_err();
    assert!(matches!(err, CoordinationError::CasConflict));
    assert!(err.is_retryable());

    // Re-running the full cycle applies on top of the winner.
    SemaphoreLock::new("b", Arc::new(store)).lock().await.unwrap();
    let sem = KvSemaphoreStore::new(kv, NAME).get().await.unwrap();
    assert_eq!(sem.holders, vec!["a", "b"]);
}

#[tokio::test]
async fn test_unavailable_store_surfaces_storage_error() {
    let kv = setup(1).await;
    let lock = SemaphoreLock::new("a", Arc::new(KvSemaphoreStore::new(kv.clone(), NAME)));

    kv.set_unavailable(true);
    let err = lock.lock().await.unwrap_err();
    assert!(matches!(err, CoordinationError::Storage { .. }));

    kv.set_unavailable(false);
    lock.lock().await.unwrap();
}
