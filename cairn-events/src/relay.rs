//! Durable relay draining the storage-backed events outbox.
//!
//! `MemoryStore::store`/`modify` enqueue their event in the same transaction as the write they
//! describe, so the event survives a crash between commit and publish. That durability is only
//! realized if something actually drains the outbox -- this is that something: it fetches
//! undelivered rows, reconstructs the envelope, redispatches it, and marks it delivered (or bumps
//! its attempt counter for the next pass). This is the at-least-once guarantee spec §4.11 promises;
//! without a relay running, the outbox just accumulates rows nothing ever reads.

use crate::dispatcher::Dispatcher;
use crate::topic::MemoryEvent;
use cairn_storage::Storage;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Default batch size a single [`OutboxRelay::drain`] call processes.
pub const DEFAULT_BATCH_SIZE: usize = 64;

pub struct OutboxRelay {
    storage: Arc<dyn Storage>,
    dispatcher: Arc<Dispatcher>,
}

impl OutboxRelay {
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>, dispatcher: Arc<Dispatcher>) -> Self {
        Self { storage, dispatcher }
    }

    /// Dispatch `event` and record the outcome against its outbox row (`event_id`): delivered on
    /// success, attempt count bumped on failure so a later [`Self::drain`] retries it. Called both
    /// from [`Self::drain`] itself and, inline, right after `MemoryStore::store`/`modify` durably
    /// enqueues an event -- attempting delivery immediately is the common case; the outbox row is
    /// what makes that attempt safe to also retry later if the process dies before this returns.
    ///
    /// # Errors
    /// Returns an error if the storage backend itself is unreachable.
    pub async fn deliver(&self, event_id: i64, event: MemoryEvent) -> anyhow::Result<bool> {
        let delivered = self.dispatcher.dispatch(event).await;
        if delivered {
            self.storage.mark_event_delivered(event_id).await?;
        } else {
            self.storage.increment_event_attempts(event_id).await?;
        }
        Ok(delivered)
    }

    /// Drain up to `limit` undelivered events via [`Self::deliver`]. A row whose payload doesn't
    /// deserialize as a [`MemoryEvent`] is logged and marked delivered anyway -- it can never
    /// succeed, and leaving it would block every row behind it in `fetch_undelivered_events`'s
    /// id-ascending order.
    ///
    /// Returns the number of rows this call saw (delivered or not).
    ///
    /// # Errors
    /// Returns an error if the storage backend itself is unreachable.
    pub async fn drain(&self, limit: usize) -> anyhow::Result<usize> {
        let rows = self.storage.fetch_undelivered_events(limit).await?;
        let seen = rows.len();

        for row in rows {
            match serde_json::from_value::<MemoryEvent>(row.payload.clone()) {
                Ok(event) => {
                    self.deliver(row.id, event).await?;
                }
                Err(err) => {
                    warn!(event_id = row.id, error = %err, "outbox row is not a valid event envelope, marking delivered");
                    self.storage.mark_event_delivered(row.id).await?;
                }
            }
        }

        Ok(seen)
    }

    /// Poll [`Self::drain`] on a fixed interval until the host process shuts down. Intended for a
    /// long-lived host; `cairn-cli`'s one-shot commands call `drain` directly instead since there's
    /// no host process left to run a background poll after the command returns.
    pub async fn run_forever(self: Arc<Self>, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            if let Err(err) = self.drain(DEFAULT_BATCH_SIZE).await {
                warn!(error = %err, "outbox drain failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::EventBus;
    use crate::handler::Listener;
    use crate::topic::Topic;
    use async_trait::async_trait;
    use cairn_storage::SqliteStorage;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingListener {
        count: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Listener for CountingListener {
        fn name(&self) -> &str {
            "counting"
        }

        fn topics(&self) -> &[Topic] {
            &[Topic::MemoryCreated]
        }

        async fn handle(&self, _event: &MemoryEvent) -> anyhow::Result<()> {
            self.count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn drain_dispatches_and_marks_delivered() {
        let storage: Arc<dyn Storage> = Arc::new(SqliteStorage::open_in_memory().await.unwrap());
        let count = Arc::new(AtomicUsize::new(0));
        let bus = EventBus::new();
        bus.register(Arc::new(CountingListener { count: Arc::clone(&count) }));
        let dispatcher = Arc::new(Dispatcher::new(bus));
        let relay = OutboxRelay::new(Arc::clone(&storage), dispatcher);

        let event = MemoryEvent::created("proj", 1, "note", true);
        storage.enqueue_event(event.topic.as_str(), serde_json::to_value(&event).unwrap()).await.unwrap();

        let seen = relay.drain(10).await.unwrap();
        assert_eq!(seen, 1);
        assert_eq!(count.load(Ordering::SeqCst), 1);

        // Delivered rows aren't redelivered on the next drain.
        let seen_again = relay.drain(10).await.unwrap();
        assert_eq!(seen_again, 0);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn drain_leaves_failed_events_for_the_next_pass() {
        let storage: Arc<dyn Storage> = Arc::new(SqliteStorage::open_in_memory().await.unwrap());
        // No listener registered for `memory.created` -> publish reports zero results -> dispatch
        // still returns `true` (nothing failed). Use an always-failing listener instead to exercise
        // the retry-left-for-next-pass path.
        struct AlwaysFailListener;
        #[async_trait]
        impl Listener for AlwaysFailListener {
            fn name(&self) -> &str {
                "always-fail"
            }
            fn topics(&self) -> &[Topic] {
                &[Topic::MemoryCreated]
            }
            async fn handle(&self, _event: &MemoryEvent) -> anyhow::Result<()> {
                anyhow::bail!("nope")
            }
        }
        let bus = EventBus::new();
        bus.register(Arc::new(AlwaysFailListener));
        let dispatcher = Arc::new(Dispatcher::new(bus).with_max_attempts(1));
        let relay = OutboxRelay::new(Arc::clone(&storage), dispatcher);

        let event = MemoryEvent::created("proj", 1, "note", true);
        storage.enqueue_event(event.topic.as_str(), serde_json::to_value(&event).unwrap()).await.unwrap();

        relay.drain(10).await.unwrap();
        let pending = storage.fetch_undelivered_events(10).await.unwrap();
        assert_eq!(pending.len(), 1, "failed event must remain undelivered for the next drain");
        assert_eq!(pending[0].attempts, 1);
    }
}
