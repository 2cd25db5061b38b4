//! Error types for the event bus and enrichment dispatcher.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, EventError>;

#[derive(Debug, Error)]
pub enum EventError {
    #[error("no listener registered for topic {0:?}")]
    NoListener(crate::Topic),

    #[error("listener failed: {0}")]
    ListenerFailed(String),

    #[error("dispatcher exhausted retries for event {event_id} after {attempts} attempts")]
    RetriesExhausted { event_id: uuid::Uuid, attempts: u32 },
}
