//! Ambient stack shared by every backend-facing crate in Cairn: retry with exponential backoff, a
//! circuit breaker for fault isolation, and per-provider rate limiting for the HTTP-backed
//! embedder/LLM/reranker clients in `cairn-providers`.
//!
//! None of this lives in `cairn-core` because `cairn-core` is a leaf dependency of nearly
//! everything in the workspace; these are concerns of *calling* a backend, not of the backend
//! contracts themselves.

pub mod circuit_breaker;
pub mod rate_limit;
pub mod retry;

pub use circuit_breaker::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError, CircuitBreakerManager, CircuitBreakerMetrics,
    CircuitState, ServicePresets,
};
pub use rate_limit::{BackoffStrategy, ProviderLimits, ProviderRateLimiter, RateLimiterMetrics};
#[cfg(feature = "rate-limiting-http")]
pub use rate_limit::RateLimitInfo;
pub use retry::{retry_with_backoff, RetryPolicy};
