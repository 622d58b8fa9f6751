//! Caller-side retry for compare-and-swap conflicts.
//!
//! Lock handles never retry on their own. Callers that want "keep trying
//! until my write lands" wrap the call:
//!
//! ```ignore
//! retry_on_conflict(&config.retry, "lock", || handle.lock()).await?;
//! ```

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::config::RetryConfig;
use crate::error::CoordinationError;

/// Re-run `operation` while it fails with [`CoordinationError::CasConflict`].
///
/// Sleeps between attempts with exponential backoff capped at
/// `config.max_backoff_ms`. Any other error, including `NoCapacity`, is
/// returned immediately. Gives up with
/// [`CoordinationError::MaxRetriesExceeded`] after `config.max_attempts`.
pub async fn retry_on_conflict<F, Fut, T>(
    config: &RetryConfig,
    operation: &str,
    mut f: F,
) -> Result<T, CoordinationError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CoordinationError>>,
{
    let mut attempt = 0u32;
    let mut backoff_ms = config.initial_backoff_ms;

    loop {
        match f().await {
            Err(CoordinationError::CasConflict) => {
                attempt += 1;
                if attempt >= config.max_attempts {
                    return Err(CoordinationError::MaxRetriesExceeded {
                        operation: operation.to_string(),
                        attempts: attempt,
                    });
                }
                debug!(operation, attempt, backoff_ms, "CAS conflict, retrying");
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                backoff_ms = backoff_ms.saturating_mul(2).min(config.max_backoff_ms);
            }
            other => return other,
        }
    }
}
