//! Async enrichment event bus for the retrieval core.
//!
//! `MemoryStore::store`/`modify` publish one of three topics — `memory.created`, `memory.updated`,
//! `memory.inactivated` — after the write commits. Listeners register against the closed [`Topic`]
//! vocabulary rather than a wildcard pattern, and [`Dispatcher`] retries a failing listener up to
//! [`dispatcher::MAX_ATTEMPTS`] times with exponential backoff. Because delivery is at-least-once,
//! every [`Listener`] must be idempotent.

pub mod bus;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod metrics;
pub mod relay;
pub mod topic;

pub use bus::EventBus;
pub use dispatcher::Dispatcher;
pub use error::{EventError, Result};
pub use handler::Listener;
pub use metrics::{EventMetrics, MetricsCollector};
pub use relay::OutboxRelay;
pub use topic::{MemoryCreatedPayload, MemoryEvent, MemoryMutatedPayload, Payload, Topic};

pub mod prelude {
    pub use crate::{Dispatcher, EventBus, EventError, Listener, MemoryEvent, OutboxRelay, Topic};
}
