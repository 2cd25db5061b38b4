//! Event throughput counters for the enrichment bus.

use crate::topic::MemoryEvent;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

/// Snapshot of event-bus throughput, keyed by topic.
#[derive(Debug, Clone, Default)]
pub struct EventMetrics {
    pub total_events: u64,
    pub events_by_topic: HashMap<&'static str, u64>,
    pub current_events_per_second: f64,
}

/// Accumulates [`EventMetrics`] as events are published.
pub struct MetricsCollector {
    metrics: Arc<RwLock<EventMetrics>>,
    start_time: Instant,
}

impl MetricsCollector {
    #[must_use]
    pub fn new() -> Self {
        Self { metrics: Arc::new(RwLock::new(EventMetrics::default())), start_time: Instant::now() }
    }

    pub fn record(&self, event: &MemoryEvent) {
        let mut metrics = self.metrics.write();
        metrics.total_events += 1;
        *metrics.events_by_topic.entry(event.topic.as_str()).or_insert(0) += 1;

        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            metrics.current_events_per_second = metrics.total_events as f64 / elapsed;
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> EventMetrics {
        self.metrics.read().clone()
    }

    pub fn reset(&self) {
        *self.metrics.write() = EventMetrics::default();
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_increments_topic_and_total_counters() {
        let collector = MetricsCollector::new();
        collector.record(&MemoryEvent::created("proj", 1, "note", true));
        collector.record(&MemoryEvent::created("proj", 2, "note", true));

        let snapshot = collector.snapshot();
        assert_eq!(snapshot.total_events, 2);
        assert_eq!(snapshot.events_by_topic.get("memory.created"), Some(&2));
    }
}
