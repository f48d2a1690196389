//! Database Retry Logic
//!
//! Exponential backoff for transient SQLite lock errors. Ingestion tools may
//! write to the store while a cleanup runs; destructive statements retry
//! until `max_wait_ms` elapses instead of failing the whole stage.

use evcat_common::Result;
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

const INITIAL_BACKOFF_MS: u64 = 10;
const MAX_BACKOFF_MS: u64 = 1000;

/// Run `operation`, retrying lock contention until `max_wait_ms` has passed
///
/// Backoff starts at 10 ms and doubles up to 1 s. Any error other than lock
/// contention returns at once. When the wait budget runs out the last lock
/// error is returned unchanged, so callers see a store failure.
pub async fn retry_on_lock<F, Fut, T>(
    operation_name: &str,
    max_wait_ms: u64,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let started = Instant::now();
    let budget = Duration::from_millis(max_wait_ms);
    let mut attempt = 0u32;
    let mut backoff = Duration::from_millis(INITIAL_BACKOFF_MS);

    loop {
        attempt += 1;

        let err = match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(operation = operation_name, attempt, "Store write went through after retry");
                }
                return Ok(value);
            }
            Err(err) if err.is_lock_contention() => err,
            Err(err) => return Err(err),
        };

        if started.elapsed() >= budget {
            error!(
                operation = operation_name,
                attempt,
                max_wait_ms,
                "Store still locked, giving up"
            );
            return Err(err);
        }

        warn!(
            operation = operation_name,
            attempt,
            backoff_ms = backoff.as_millis() as u64,
            "Store locked, backing off"
        );
        tokio::time::sleep(backoff).await;
        backoff = (backoff * 2).min(Duration::from_millis(MAX_BACKOFF_MS));
    }
}
