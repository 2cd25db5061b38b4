//! Listener contract for `memory.*` topics.

use crate::topic::MemoryEvent;
use crate::Topic;
use async_trait::async_trait;

/// A listener subscribed to exactly the topics it returns from [`Listener::topics`].
///
/// Implementations must be idempotent: delivery is at-least-once, so the same event may be handled
/// more than once.
#[async_trait]
pub trait Listener: Send + Sync {
    fn name(&self) -> &str;

    fn topics(&self) -> &[Topic];

    async fn handle(&self, event: &MemoryEvent) -> anyhow::Result<()>;
}
