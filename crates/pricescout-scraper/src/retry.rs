//! Exponential backoff for transient fetch failures.
//!
//! Only rate limiting (429) and connection-level transport errors are
//! retried. Blocks, 404s, timeouts, and unexpected statuses are returned
//! immediately: the per-source timeout already bounds how long a source may
//! take, and repeating those requests would not change the outcome.

use std::future::Future;
use std::time::Duration;

use crate::error::FetchError;

/// Upper bound on how long a `Retry-After` header can stall a retry.
const MAX_RETRY_AFTER: Duration = Duration::from_secs(10);

fn is_retriable(err: &FetchError) -> bool {
    matches!(
        err,
        FetchError::RateLimited { .. } | FetchError::Transport(_)
    )
}

/// Delay before retry number `attempt + 1`: `backoff_base_ms * 2^attempt`,
/// raised to the server's `Retry-After` (capped) when it asks for longer.
fn backoff_delay(err: &FetchError, attempt: u32, backoff_base_ms: u64) -> Duration {
    let backoff = Duration::from_millis(backoff_base_ms.saturating_mul(1u64 << attempt.min(62)));
    match err {
        FetchError::RateLimited {
            retry_after_secs, ..
        } => backoff.max(Duration::from_secs(*retry_after_secs).min(MAX_RETRY_AFTER)),
        _ => backoff,
    }
}

/// Run `operation`, retrying retriable failures up to `max_retries` extra
/// times. Non-retriable errors and the last error after exhausting retries
/// are returned as-is.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let mut attempt = 0u32;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if !is_retriable(&err) || attempt >= max_retries {
            return Err(err);
        }

        let delay = backoff_delay(&err, attempt, backoff_base_ms);
        tracing::warn!(
            attempt,
            max_retries,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            error = %err,
            "transient fetch error, retrying after backoff"
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
