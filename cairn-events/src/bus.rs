//! Static-routing-table event bus for `memory.*` topics.
//!
//! Unlike a wildcard pub/sub bus, listeners register for one or more [`Topic`] variants up front;
//! `publish` looks them up in a `HashMap` rather than matching a string pattern against every
//! subscriber.

use crate::handler::Listener;
use crate::topic::MemoryEvent;
use crate::Topic;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Pub/sub bus restricted to the closed `Topic` vocabulary.
#[derive(Clone, Default)]
pub struct EventBus {
    routes: Arc<DashMap<Topic, Vec<Arc<dyn Listener>>>>,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self { routes: Arc::new(DashMap::new()) }
    }

    /// Register a listener against every topic it declares interest in.
    pub fn register(&self, listener: Arc<dyn Listener>) {
        for topic in listener.topics() {
            self.routes.entry(*topic).or_default().push(Arc::clone(&listener));
        }
    }

    /// Publish an event to every listener registered for its topic.
    ///
    /// the `MemoryStore` commit happens-before this call; this method fans the event out to in-process
    /// listeners synchronously for ordering within a topic, but listener errors are reported to the
    /// caller (normally the [`crate::dispatcher::Dispatcher`], which handles retry) rather than
    /// panicking the publisher.
    pub async fn publish(&self, event: MemoryEvent) -> Vec<(String, anyhow::Result<()>)> {
        self.publish_to(event, None).await
    }

    /// Publish an event to the subset of its topic's listeners named in `only`, or to all of them
    /// when `only` is `None`. Lets the [`crate::dispatcher::Dispatcher`] re-deliver a retry only to
    /// the listeners that failed, instead of re-running ones that already returned `Ok`.
    pub async fn publish_to(&self, event: MemoryEvent, only: Option<&std::collections::HashSet<String>>) -> Vec<(String, anyhow::Result<()>)> {
        let Some(listeners) = self.routes.get(&event.topic).map(|l| l.clone()) else {
            debug!(topic = event.topic.as_str(), "no listener registered for topic");
            return Vec::new();
        };

        let mut results = Vec::new();
        for listener in listeners {
            if only.is_some_and(|names| !names.contains(listener.name())) {
                continue;
            }
            let outcome = listener.handle(&event).await;
            if let Err(ref e) = outcome {
                warn!(topic = event.topic.as_str(), listener = listener.name(), error = %e, "listener failed");
            }
            results.push((listener.name().to_string(), outcome));
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topic::MemoryEvent;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingListener {
        topics: Vec<Topic>,
        count: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Listener for CountingListener {
        fn name(&self) -> &str {
            "counting"
        }

        fn topics(&self) -> &[Topic] {
            &self.topics
        }

        async fn handle(&self, _event: &MemoryEvent) -> anyhow::Result<()> {
            self.count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn publish_routes_only_to_subscribed_topics() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        bus.register(Arc::new(CountingListener { topics: vec![Topic::MemoryCreated], count: Arc::clone(&count) }));

        bus.publish(MemoryEvent::created("proj", 1, "note", true)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        bus.publish(MemoryEvent::mutated(Topic::MemoryUpdated, "proj", 1, None)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1, "listener not subscribed to memory.updated");
    }

    #[tokio::test]
    async fn publish_with_no_listener_is_a_noop() {
        let bus = EventBus::new();
        let results = bus.publish(MemoryEvent::created("proj", 1, "note", true)).await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn publish_to_only_invokes_named_listeners() {
        let bus = EventBus::new();
        let count_a = Arc::new(AtomicUsize::new(0));
        let count_b = Arc::new(AtomicUsize::new(0));
        bus.register(Arc::new(CountingListener { topics: vec![Topic::MemoryCreated], count: Arc::clone(&count_a) }));
        // Both listeners are named "counting" above -- give the second one a distinct name so
        // `publish_to` can select it alone.
        struct NamedCountingListener {
            name: &'static str,
            topics: Vec<Topic>,
            count: Arc<AtomicUsize>,
        }
        #[async_trait]
        impl Listener for NamedCountingListener {
            fn name(&self) -> &str {
                self.name
            }
            fn topics(&self) -> &[Topic] {
                &self.topics
            }
            async fn handle(&self, _event: &MemoryEvent) -> anyhow::Result<()> {
                self.count.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }
        bus.register(Arc::new(NamedCountingListener { name: "b", topics: vec![Topic::MemoryCreated], count: Arc::clone(&count_b) }));

        let only = std::collections::HashSet::from(["b".to_string()]);
        bus.publish_to(MemoryEvent::created("proj", 1, "note", true), Some(&only)).await;

        assert_eq!(count_a.load(Ordering::SeqCst), 0, "listener not named in `only` must not run");
        assert_eq!(count_b.load(Ordering::SeqCst), 1);
    }
}
