//! At-least-once redelivery with exponential backoff.
//!
//! The [`EventBus`] fans an event out synchronously and reports per-listener outcomes; the
//! `Dispatcher` wraps that in a retry loop so a transient listener failure (e.g. the knowledge-
//! extraction LLM call timing out) doesn't drop the event. Listeners are required to be idempotent
//! because the same event may be replayed on retry, and because at-least-once delivery gives no
//! other guarantee.

use crate::bus::EventBus;
use crate::topic::MemoryEvent;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tracing::{error, warn};

/// Number of delivery attempts before an event is given up on.
pub const MAX_ATTEMPTS: u32 = 5;

/// Base delay for the exponential backoff between attempts.
const BASE_DELAY: Duration = Duration::from_millis(200);

/// Drives [`EventBus::publish`] with retries, backing off exponentially
/// between attempts (200ms, 400ms, 800ms, 1.6s) until a listener succeeds or
/// `MAX_ATTEMPTS` is exhausted.
pub struct Dispatcher {
    bus: EventBus,
    max_attempts: u32,
}

impl Dispatcher {
    #[must_use]
    pub fn new(bus: EventBus) -> Self {
        Self { bus, max_attempts: MAX_ATTEMPTS }
    }

    /// Override the attempt budget (tests use a small budget to avoid
    /// sleeping through the full backoff schedule).
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Dispatch an event, retrying any listener that fails until it
    /// succeeds or the attempt budget is exhausted. Different listeners on
    /// the same topic are retried independently so one failing listener
    /// doesn't re-run another that already succeeded. Returns `true` once
    /// every registered listener has reported success, `false` if any
    /// listener is still failing once the attempt budget is exhausted --
    /// the signal an outbox relay needs to decide between marking the event
    /// delivered and leaving it for the next drain.
    pub async fn dispatch(&self, event: MemoryEvent) -> bool {
        let mut results: HashMap<String, anyhow::Result<()>> =
            self.bus.publish(event.clone()).await.into_iter().collect();
        let mut attempt = 1;

        while attempt < self.max_attempts {
            let failures: HashSet<String> =
                results.iter().filter(|(_, r)| r.is_err()).map(|(name, _)| name.clone()).collect();
            if failures.is_empty() {
                return true;
            }

            attempt += 1;
            let delay = BASE_DELAY * 2u32.pow(attempt - 2);
            warn!(
                event_id = %event.event_id,
                topic = event.topic.as_str(),
                attempt,
                failing = ?failures,
                delay_ms = delay.as_millis(),
                "retrying failed listener(s)"
            );
            tokio::time::sleep(delay).await;

            for (name, outcome) in self.bus.publish_to(event.clone(), Some(&failures)).await {
                results.insert(name, outcome);
            }
        }

        let still_failing: Vec<String> =
            results.into_iter().filter(|(_, r)| r.is_err()).map(|(name, _)| name).collect();
        if !still_failing.is_empty() {
            error!(
                event_id = %event.event_id,
                topic = event.topic.as_str(),
                attempts = self.max_attempts,
                failing = ?still_failing,
                "exhausted retries, giving up on event"
            );
            return false;
        }
        true
    }
}
