//! Exponential backoff retry for transient-external failures. The embedder's failure contract is
//! the canonical caller: transient errors (rate limiting, timeouts, 5xx) are retried up to three
//! times with delays of 1s, 2s, 4s; non-transient errors surface immediately.

use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// A retry schedule: how many attempts, and the base delay each attempt
/// backs off from.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub const fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self { max_attempts, base_delay }
    }

    /// The embedder's contract: 3 retries at 1s, 2s, 4s.
    #[must_use]
    pub const fn embedder_default() -> Self {
        Self { max_attempts: 3, base_delay: Duration::from_secs(1) }
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::embedder_default()
    }
}

/// Run `f`, retrying per `policy` as long as `is_retryable` says the error
/// is transient. Non-retryable errors return immediately on the first
/// attempt. The closure is re-invoked fresh on each attempt since the
/// futures it returns are not reusable.
pub async fn retry_with_backoff<F, Fut, T, E>(policy: RetryPolicy, is_retryable: impl Fn(&E) -> bool, mut f: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 1;
    loop {
        match f().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < policy.max_attempts && is_retryable(&err) => {
                let delay = policy.delay_for(attempt);
                warn!(attempt, delay_ms = delay.as_millis(), error = %err, "retrying after transient failure");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn retries_transient_errors_until_success() {
        let attempts = AtomicU32::new(0);
        let policy = RetryPolicy::new(3, Duration::from_millis(1));

        let result: Result<&str, &str> = retry_with_backoff(
            policy,
            |_| true,
            || {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                async move { if n < 2 { Err("transient") } else { Ok("ok") } }
            },
        )
        .await;

        assert_eq!(result, Ok("ok"));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn does_not_retry_non_transient_errors() {
        let attempts = AtomicU32::new(0);
        let policy = RetryPolicy::new(3, Duration::from_millis(1));

        let result: Result<&str, &str> = retry_with_backoff(
            policy,
            |_| false,
            || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err("permanent") }
            },
        )
        .await;

        assert_eq!(result, Err("permanent"));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let attempts = AtomicU32::new(0);
        let policy = RetryPolicy::new(3, Duration::from_millis(1));

        let result: Result<&str, &str> = retry_with_backoff(
            policy,
            |_| true,
            || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err("still failing") }
            },
        )
        .await;

        assert_eq!(result, Err("still failing"));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }
}
