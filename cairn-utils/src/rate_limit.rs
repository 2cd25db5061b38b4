//! Per-provider rate limiting for the HTTP-backed embedder/LLM/reranker clients in `cairn-
//! providers`.
//!
//! A token bucket per provider name tracks allow/deny counts; requests beyond a provider's
//! `requests_per_minute` are denied until the bucket refills.
//! [`ProviderRateLimiter::execute_with_retry`] pairs that with [`BackoffStrategy`] so a caller gets
//! one call that both respects the limit and retries on transient failure.

use dashmap::DashMap;
use std::collections::HashMap;
use std::error::Error as StdError;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Backoff schedule used by [`ProviderRateLimiter::execute_with_retry`],
/// capped at 5 minutes regardless of strategy or attempt count.
#[derive(Debug, Clone, Copy)]
pub enum BackoffStrategy {
    Linear { increment_ms: u64 },
    Exponential { base_ms: u64 },
}

const MAX_BACKOFF: Duration = Duration::from_millis(300_000);

impl BackoffStrategy {
    /// `attempt` is 0-based (the delay before the *next* attempt).
    #[must_use]
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        let millis = match *self {
            Self::Linear { increment_ms } => increment_ms.saturating_mul(u64::from(attempt) + 1),
            Self::Exponential { base_ms } => base_ms.saturating_mul(1u64 << attempt.min(20)),
        };
        Duration::from_millis(millis).min(MAX_BACKOFF)
    }
}

impl Default for BackoffStrategy {
    fn default() -> Self {
        Self::Exponential { base_ms: 100 }
    }
}

/// Per-provider limit configuration.
#[derive(Debug, Clone)]
pub struct ProviderLimits {
    pub requests_per_minute: u32,
    pub allow_burst: bool,
    pub backoff: BackoffStrategy,
    pub max_retries: u32,
}

impl ProviderLimits {
    #[must_use]
    pub fn generic() -> Self {
        Self { requests_per_minute: 60, allow_burst: false, backoff: BackoffStrategy::default(), max_retries: 5 }
    }

    #[must_use]
    pub fn openai() -> Self {
        Self { requests_per_minute: 3_500, allow_burst: true, ..Self::generic() }
    }

    #[must_use]
    pub fn bedrock() -> Self {
        Self { requests_per_minute: 1_000, allow_burst: true, ..Self::generic() }
    }

    #[must_use]
    pub fn duckduckgo() -> Self {
        Self { requests_per_minute: 20, allow_burst: false, ..Self::generic() }
    }

    #[must_use]
    pub fn for_provider(name: &str) -> Self {
        match name {
            "openai" => Self::openai(),
            "bedrock" | "titan" => Self::bedrock(),
            "duckduckgo" => Self::duckduckgo(),
            _ => Self::generic(),
        }
    }
}

/// Parsed `X-RateLimit-*`/`Retry-After` headers from a provider response.
#[cfg(feature = "rate-limiting-http")]
#[derive(Debug, Clone, Copy, Default)]
pub struct RateLimitInfo {
    pub remaining: Option<u64>,
    pub limit: Option<u64>,
    pub reset_at: Option<u64>,
    pub retry_after: Option<Duration>,
}

#[cfg(feature = "rate-limiting-http")]
impl RateLimitInfo {
    #[must_use]
    pub fn from_headers(headers: &reqwest::header::HeaderMap) -> Self {
        let parse_u64 = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).and_then(|s| s.parse::<u64>().ok());
        Self {
            remaining: parse_u64("x-ratelimit-remaining"),
            limit: parse_u64("x-ratelimit-limit"),
            reset_at: parse_u64("x-ratelimit-reset"),
            retry_after: parse_u64("retry-after").map(Duration::from_secs),
        }
    }

    /// How long to wait before the next request, if the response signaled
    /// exhaustion (`remaining == 0`, or an explicit `Retry-After`).
    #[must_use]
    pub fn wait_time(&self) -> Option<Duration> {
        if let Some(retry_after) = self.retry_after {
            return Some(retry_after);
        }
        if self.remaining == Some(0) {
            return Some(Duration::from_secs(1));
        }
        None
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RateLimiterMetrics {
    pub requests_allowed: u64,
    pub requests_denied: u64,
}

struct TokenBucket {
    capacity: f64,
    tokens: f64,
    refill_per_sec: f64,
    updated_at: Instant,
    allowed: AtomicU64,
    denied: AtomicU64,
}

impl TokenBucket {
    fn new(limits: &ProviderLimits) -> Self {
        let capacity = f64::from(limits.requests_per_minute.max(1));
        Self {
            capacity,
            tokens: capacity,
            refill_per_sec: capacity / 60.0,
            updated_at: Instant::now(),
            allowed: AtomicU64::new(0),
            denied: AtomicU64::new(0),
        }
    }

    fn try_acquire(&mut self) -> bool {
        let elapsed = self.updated_at.elapsed().as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        self.updated_at = Instant::now();

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            self.allowed.fetch_add(1, Ordering::Relaxed);
            true
        } else {
            self.denied.fetch_add(1, Ordering::Relaxed);
            false
        }
    }
}

#[derive(Error, Debug)]
pub enum RateLimitError {
    #[error("provider {0} not configured")]
    UnknownProvider(String),
    #[error("rate limit exceeded for provider {0}")]
    Exceeded(String),
    #[error("exhausted retries: {0}")]
    RetriesExhausted(BoxError),
}

/// Token-bucket rate limiter keyed by provider name, shared cheaply via
/// internal `Arc`s (cloning gives a handle to the same buckets/limits).
#[derive(Clone)]
pub struct ProviderRateLimiter {
    limits: Arc<DashMap<String, ProviderLimits>>,
    buckets: Arc<DashMap<String, parking_lot::Mutex<TokenBucket>>>,
}

impl Default for ProviderRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderRateLimiter {
    #[must_use]
    pub fn new() -> Self {
        Self { limits: Arc::new(DashMap::new()), buckets: Arc::new(DashMap::new()) }
    }

    /// # Errors
    /// Never fails today; returns `Result` to leave room for backend-backed
    /// configuration stores.
    pub async fn with_configs(configs: HashMap<String, ProviderLimits>) -> Result<Self, RateLimitError> {
        let limiter = Self::new();
        for (name, limits) in configs {
            limiter.add_provider(&name, limits).await?;
        }
        Ok(limiter)
    }

    /// # Errors
    /// Never fails today; see [`Self::with_configs`].
    pub async fn add_provider(&self, name: &str, limits: ProviderLimits) -> Result<(), RateLimitError> {
        self.buckets.insert(name.to_string(), parking_lot::Mutex::new(TokenBucket::new(&limits)));
        self.limits.insert(name.to_string(), limits);
        Ok(())
    }

    fn ensure_provider(&self, name: &str) {
        if !self.buckets.contains_key(name) {
            let limits = ProviderLimits::for_provider(name);
            self.buckets.insert(name.to_string(), parking_lot::Mutex::new(TokenBucket::new(&limits)));
            self.limits.insert(name.to_string(), limits);
        }
    }

    /// # Errors
    /// Returns [`RateLimitError::Exceeded`] if the provider's bucket is
    /// empty.
    pub async fn check_rate_limit(&self, provider: &str) -> Result<(), RateLimitError> {
        self.ensure_provider(provider);
        let bucket = self.buckets.get(provider).ok_or_else(|| RateLimitError::UnknownProvider(provider.to_string()))?;
        if bucket.lock().try_acquire() {
            Ok(())
        } else {
            Err(RateLimitError::Exceeded(provider.to_string()))
        }
    }

    #[must_use]
    pub async fn get_metrics(&self, provider: &str) -> Option<RateLimiterMetrics> {
        self.buckets.get(provider).map(|bucket| {
            let bucket = bucket.lock();
            RateLimiterMetrics {
                requests_allowed: bucket.allowed.load(Ordering::Relaxed),
                requests_denied: bucket.denied.load(Ordering::Relaxed),
            }
        })
    }

    #[must_use]
    pub async fn get_all_metrics(&self) -> HashMap<String, RateLimiterMetrics> {
        let mut out = HashMap::new();
        for entry in self.buckets.iter() {
            let bucket = entry.value().lock();
            out.insert(
                entry.key().clone(),
                RateLimiterMetrics {
                    requests_allowed: bucket.allowed.load(Ordering::Relaxed),
                    requests_denied: bucket.denied.load(Ordering::Relaxed),
                },
            );
        }
        out
    }

    /// Run `f`, retrying with this provider's configured backoff on error,
    /// up to its `max_retries`. Does not itself consult `check_rate_limit`
    /// so callers can compose freely (check once, retry on failure).
    ///
    /// # Errors
    /// Returns [`RateLimitError::RetriesExhausted`] once the retry budget is
    /// spent.
    pub async fn execute_with_retry<T>(
        &self,
        provider: &str,
        mut f: impl FnMut() -> BoxFuture<'static, Result<T, BoxError>>,
    ) -> Result<T, RateLimitError> {
        self.ensure_provider(provider);
        let limits = self.limits.get(provider).map(|l| l.clone()).unwrap_or_else(ProviderLimits::generic);

        let mut attempt = 0;
        loop {
            match f().await {
                Ok(value) => return Ok(value),
                Err(err) if attempt + 1 < limits.max_retries => {
                    let delay = limits.backoff.calculate_delay(attempt);
                    tracing::warn!(provider, attempt, delay_ms = delay.as_millis(), error = %err, "retrying after failure");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(RateLimitError::RetriesExhausted(err)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn token_bucket_allows_up_to_capacity() {
        let limiter = ProviderRateLimiter::new();
        let mut limits = ProviderLimits::generic();
        limits.requests_per_minute = 2;
        limiter.add_provider("p", limits).await.unwrap();

        assert!(limiter.check_rate_limit("p").await.is_ok());
        assert!(limiter.check_rate_limit("p").await.is_ok());
    }

    #[test]
    fn exponential_backoff_caps_at_five_minutes() {
        let strategy = BackoffStrategy::Exponential { base_ms: 100 };
        assert_eq!(strategy.calculate_delay(20), Duration::from_millis(300_000));
    }
}
