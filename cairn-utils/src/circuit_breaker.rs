//! Circuit breaker for backend fault isolation.
//!
//! Every external call the retrieval pipeline makes — embedder, LLM, graph, reranker — goes through
//! a [`CircuitBreaker`] (directly, or via a [`CircuitBreakerManager`] keyed by backend name) so a
//! failing backend is isolated after a threshold of failures instead of being hammered with calls
//! that are likely to time out anyway. Closed -> Open on `failure_threshold_count`
//! consecutive/recent failures; Open -> HalfOpen after `reset_timeout`; HalfOpen -> Closed after
//! `success_threshold` consecutive successes, or back to Open on a single failure.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::RwLock;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

/// Error surfaced by [`CircuitBreaker::execute`]: either the circuit refused
/// the call outright, or the call ran and failed with `E`.
#[derive(Debug, Error)]
pub enum CircuitBreakerError<E> {
    #[error("circuit is open, call rejected")]
    Open,
    #[error(transparent)]
    Inner(E),
}

type AlertHandler = Arc<dyn Fn(String) + Send + Sync>;

#[derive(Clone)]
pub struct CircuitBreakerConfig {
    pub failure_threshold_count: u32,
    pub success_threshold: u32,
    pub reset_timeout: Duration,
    alert_handler: Option<AlertHandler>,
}

impl std::fmt::Debug for CircuitBreakerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreakerConfig")
            .field("failure_threshold_count", &self.failure_threshold_count)
            .field("success_threshold", &self.success_threshold)
            .field("reset_timeout", &self.reset_timeout)
            .finish_non_exhaustive()
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self { failure_threshold_count: 5, success_threshold: 2, reset_timeout: Duration::from_secs(30), alert_handler: None }
    }
}

impl CircuitBreakerConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn with_failure_threshold(mut self, count: u32) -> Self {
        self.failure_threshold_count = count;
        self
    }

    #[must_use]
    pub const fn with_success_threshold(mut self, count: u32) -> Self {
        self.success_threshold = count;
        self
    }

    #[must_use]
    pub const fn with_reset_timeout(mut self, timeout: Duration) -> Self {
        self.reset_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_alert_handler(mut self, handler: impl Fn(String) + Send + Sync + 'static) -> Self {
        self.alert_handler = Some(Arc::new(handler));
        self
    }
}

/// Cumulative counters for a breaker; health is derived from `success_rate`, not just current
/// state, so a breaker that is `Closed` but limping can still be reported degraded.
#[derive(Debug, Clone, Copy, Default)]
pub struct CircuitBreakerMetrics {
    pub total_allowed: u64,
    pub total_successes: u64,
    pub total_failures: u64,
    pub current_state: CircuitStateSnapshot,
}

/// `Copy`-friendly mirror of [`CircuitState`] for embedding in metrics
/// snapshots without borrowing the breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CircuitStateSnapshot {
    #[default]
    Closed,
    Open,
    HalfOpen,
}

impl From<CircuitState> for CircuitStateSnapshot {
    fn from(s: CircuitState) -> Self {
        match s {
            CircuitState::Closed => Self::Closed,
            CircuitState::Open => Self::Open,
            CircuitState::HalfOpen => Self::HalfOpen,
        }
    }
}

impl CircuitBreakerMetrics {
    #[must_use]
    pub fn success_rate(&self) -> f64 {
        let total = self.total_successes + self.total_failures;
        if total == 0 {
            100.0
        } else {
            (self.total_successes as f64 / total as f64) * 100.0
        }
    }

    /// Maps onto `BackendHealth::Healthy` in `cairn-core`.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.success_rate() > 95.0
    }

    /// Maps onto `BackendHealth::Degraded`.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.success_rate() < 90.0
    }
}

struct Inner {
    state: CircuitState,
    failures: u32,
    successes_in_half_open: u32,
    opened_at: Option<Instant>,
}

/// A single backend's breaker. Cheap to clone (shares state via `Arc`).
#[derive(Clone)]
pub struct CircuitBreaker {
    config: Arc<CircuitBreakerConfig>,
    inner: Arc<Mutex<Inner>>,
    total_allowed: Arc<AtomicU64>,
    total_successes: Arc<AtomicU64>,
    total_failures: Arc<AtomicU64>,
}

impl CircuitBreaker {
    #[must_use]
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config: Arc::new(config),
            inner: Arc::new(Mutex::new(Inner { state: CircuitState::Closed, failures: 0, successes_in_half_open: 0, opened_at: None })),
            total_allowed: Arc::new(AtomicU64::new(0)),
            total_successes: Arc::new(AtomicU64::new(0)),
            total_failures: Arc::new(AtomicU64::new(0)),
        }
    }

    pub async fn current_state(&self) -> CircuitState {
        self.maybe_transition_to_half_open();
        self.inner.lock().state
    }

    fn maybe_transition_to_half_open(&self) {
        let mut inner = self.inner.lock();
        if inner.state == CircuitState::Open {
            if let Some(opened_at) = inner.opened_at {
                if opened_at.elapsed() >= self.config.reset_timeout {
                    inner.state = CircuitState::HalfOpen;
                    inner.successes_in_half_open = 0;
                }
            }
        }
    }

    /// Whether a call may proceed right now. Does not itself count as an
    /// attempt; callers typically follow with `record_success`/
    /// `record_failure`, or use [`Self::execute`] to do both atomically.
    pub async fn allow_request(&self) -> Result<(), CircuitBreakerError<std::convert::Infallible>> {
        self.maybe_transition_to_half_open();
        let state = self.inner.lock().state;
        if state == CircuitState::Open {
            return Err(CircuitBreakerError::Open);
        }
        self.total_allowed.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    pub async fn record_success(&self) {
        self.total_successes.fetch_add(1, Ordering::Relaxed);
        let mut inner = self.inner.lock();
        match inner.state {
            CircuitState::Closed => inner.failures = 0,
            CircuitState::HalfOpen => {
                inner.successes_in_half_open += 1;
                if inner.successes_in_half_open >= self.config.success_threshold {
                    inner.state = CircuitState::Closed;
                    inner.failures = 0;
                    inner.opened_at = None;
                }
            }
            CircuitState::Open => {}
        }
    }

    pub async fn record_failure(&self) {
        self.total_failures.fetch_add(1, Ordering::Relaxed);
        let mut inner = self.inner.lock();
        match inner.state {
            CircuitState::Closed => {
                inner.failures += 1;
                if inner.failures >= self.config.failure_threshold_count {
                    inner.state = CircuitState::Open;
                    inner.opened_at = Some(Instant::now());
                    drop(inner);
                    self.alert(format!("Circuit opened after {} failures", self.config.failure_threshold_count));
                }
            }
            CircuitState::HalfOpen => {
                inner.state = CircuitState::Open;
                inner.opened_at = Some(Instant::now());
                inner.failures = self.config.failure_threshold_count;
            }
            CircuitState::Open => {}
        }
    }

    fn alert(&self, message: String) {
        if let Some(handler) = &self.config.alert_handler {
            handler(message);
        }
    }

    /// Force the breaker into a given state, bypassing the threshold logic
    /// (operator override / tests).
    pub async fn force_state(&self, state: CircuitState) {
        let mut inner = self.inner.lock();
        inner.state = state;
        inner.failures = 0;
        inner.successes_in_half_open = 0;
        inner.opened_at = if state == CircuitState::Open { Some(Instant::now()) } else { None };
    }

    pub async fn metrics(&self) -> CircuitBreakerMetrics {
        CircuitBreakerMetrics {
            total_allowed: self.total_allowed.load(Ordering::Relaxed),
            total_successes: self.total_successes.load(Ordering::Relaxed),
            total_failures: self.total_failures.load(Ordering::Relaxed),
            current_state: self.current_state().await.into(),
        }
    }

    /// Run `f` if the circuit allows it, recording the outcome.
    pub async fn execute<T, E>(&self, f: impl FnOnce() -> BoxFuture<'static, Result<T, E>>) -> Result<T, CircuitBreakerError<E>> {
        self.allow_request().await.map_err(|_| CircuitBreakerError::Open)?;
        match f().await {
            Ok(value) => {
                self.record_success().await;
                Ok(value)
            }
            Err(err) => {
                self.record_failure().await;
                Err(CircuitBreakerError::Inner(err))
            }
        }
    }
}

/// Presets for common backend shapes.
pub struct ServicePresets;

impl ServicePresets {
    #[must_use]
    pub fn http_api() -> CircuitBreakerConfig {
        CircuitBreakerConfig::new().with_failure_threshold(5).with_reset_timeout(Duration::from_secs(30)).with_success_threshold(2)
    }

    #[must_use]
    pub fn database() -> CircuitBreakerConfig {
        CircuitBreakerConfig::new().with_failure_threshold(3).with_reset_timeout(Duration::from_secs(60)).with_success_threshold(2)
    }

    #[must_use]
    pub fn critical_service() -> CircuitBreakerConfig {
        CircuitBreakerConfig::new().with_failure_threshold(2).with_reset_timeout(Duration::from_secs(300)).with_success_threshold(3)
    }

    #[must_use]
    pub fn high_volume() -> CircuitBreakerConfig {
        CircuitBreakerConfig::new().with_failure_threshold(20).with_reset_timeout(Duration::from_secs(10)).with_success_threshold(5)
    }
}

/// One breaker per backend name, created lazily. `cairn-providers` keys this by provider name
/// (`"candle-bge-small"`, `"openai"`,...); the retrieval pipeline keys it by role (`"embedder"`,
/// `"llm"`, `"graph"`, `"reranker"`).
#[derive(Default)]
pub struct CircuitBreakerManager {
    breakers: RwLock<HashMap<String, CircuitBreaker>>,
    default_config: Option<fn() -> CircuitBreakerConfig>,
}

impl CircuitBreakerManager {
    #[must_use]
    pub fn with_default_config(default_config: fn() -> CircuitBreakerConfig) -> Self {
        Self { breakers: RwLock::new(HashMap::new()), default_config: Some(default_config) }
    }

    pub async fn configure_service(&self, name: &str, config: CircuitBreakerConfig) {
        self.breakers.write().await.insert(name.to_string(), CircuitBreaker::new(config));
    }

    pub async fn get_or_create(&self, name: &str) -> CircuitBreaker {
        if let Some(existing) = self.breakers.read().await.get(name) {
            return existing.clone();
        }
        let config = self.default_config.map_or_else(CircuitBreakerConfig::default, |f| f());
        let breaker = CircuitBreaker::new(config);
        self.breakers.write().await.insert(name.to_string(), breaker.clone());
        breaker
    }

    pub async fn execute<T, E>(&self, name: &str, f: impl FnOnce() -> BoxFuture<'static, Result<T, E>>) -> Result<T, CircuitBreakerError<E>> {
        self.get_or_create(name).await.execute(f).await
    }

    pub async fn all_metrics(&self) -> HashMap<String, CircuitBreakerMetrics> {
        let mut out = HashMap::new();
        for (name, breaker) in self.breakers.read().await.iter() {
            out.insert(name.clone(), breaker.metrics().await);
        }
        out
    }

    /// Names of every backend whose breaker is currently open.
    pub async fn open_circuits(&self) -> Vec<String> {
        let mut open = Vec::new();
        for (name, breaker) in self.breakers.read().await.iter() {
            if breaker.current_state().await == CircuitState::Open {
                open.push(name.clone());
            }
        }
        open
    }
}
