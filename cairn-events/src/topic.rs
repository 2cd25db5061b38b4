//! `memory.*` event envelope and the closed topic vocabulary.
//!
//! Listeners register against an explicit `Topic` variant, not a wildcard string pattern — the
//! dispatcher matches against a static routing table built at construction time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The closed set of topics the retrieval core publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    MemoryCreated,
    MemoryUpdated,
    MemoryInactivated,
}

impl Topic {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MemoryCreated => "memory.created",
            Self::MemoryUpdated => "memory.updated",
            Self::MemoryInactivated => "memory.inactivated",
        }
    }
}

/// Payload carried by `memory.created`: enough to drive async enrichment without a second read,
/// optionally short-circuiting the LLM extraction call if the caller already ran it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryCreatedPayload {
    pub memory_id: i64,
    pub project_id: String,
    pub memory_type: String,
    pub enrich: bool,
    pub extraction_result: Option<serde_json::Value>,
}

/// Payload carried by `memory.updated` / `memory.inactivated`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryMutatedPayload {
    pub memory_id: i64,
    pub project_id: String,
    pub reason: Option<String>,
}

/// Generic payload carried by every topic's envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    Created(MemoryCreatedPayload),
    Mutated(MemoryMutatedPayload),
}

/// The envelope published on every topic: `{event_id, session_name, project, memory_id, payload}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryEvent {
    pub event_id: Uuid,
    pub topic: Topic,
    pub session_name: Option<String>,
    pub project: String,
    pub memory_id: i64,
    pub payload: Payload,
    pub published_at: DateTime<Utc>,
}

impl MemoryEvent {
    #[must_use]
    pub fn created(project: impl Into<String>, memory_id: i64, memory_type: &str, enrich: bool) -> Self {
        let project = project.into();
        Self {
            event_id: Uuid::new_v4(),
            topic: Topic::MemoryCreated,
            session_name: None,
            project: project.clone(),
            memory_id,
            payload: Payload::Created(MemoryCreatedPayload {
                memory_id,
                project_id: project,
                memory_type: memory_type.to_string(),
                enrich,
                extraction_result: None,
            }),
            published_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn mutated(topic: Topic, project: impl Into<String>, memory_id: i64, reason: Option<String>) -> Self {
        let project = project.into();
        Self {
            event_id: Uuid::new_v4(),
            topic,
            session_name: None,
            project: project.clone(),
            memory_id,
            payload: Payload::Mutated(MemoryMutatedPayload { memory_id, project_id: project, reason }),
            published_at: Utc::now(),
        }
    }
}
