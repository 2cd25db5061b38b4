//! Plain row types for the storage layer.
//!
//! These mirror `cairn-memory`'s domain types field-for-field but stay
//! string/primitive-typed at this layer so `cairn-storage` has no
//! dependency on `cairn-memory` (which depends on it). Conversion between
//! the two lives in `cairn-memory`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectRow {
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryRow {
    pub id: i64,
    pub project: String,
    pub content: String,
    pub summary: Option<String>,
    pub memory_type: String,
    pub importance: f32,
    pub tags: Vec<String>,
    pub auto_tags: Vec<String>,
    pub related_files: Vec<String>,
    pub session_id: Option<String>,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub active: bool,
    pub inactivation_reason: Option<String>,
    pub embedding: Vec<f32>,
}

/// Fields accepted by [`crate::Storage::insert_memory`]; `id` is assigned by
/// the backend.
#[derive(Debug, Clone)]
pub struct NewMemoryRow {
    pub project: String,
    pub content: String,
    pub summary: Option<String>,
    pub memory_type: String,
    pub importance: f32,
    pub tags: Vec<String>,
    pub auto_tags: Vec<String>,
    pub related_files: Vec<String>,
    pub session_id: Option<String>,
    pub author: String,
    pub embedding: Vec<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationRow {
    pub source_id: i64,
    pub target_id: i64,
    pub relation: String,
    pub created_at: DateTime<Utc>,
}

/// A durable outbox row backing at-least-once event delivery
/// (`cairn-events`). Storage only tracks delivery bookkeeping; the payload
/// is an opaque JSON blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRow {
    pub id: i64,
    pub topic: String,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub attempts: i32,
}

/// Filter accepted by [`crate::Storage::list_memories`].
#[derive(Debug, Clone, Default)]
pub struct MemoryFilter {
    pub project: Option<String>,
    pub memory_type: Option<String>,
    pub tags: Vec<String>,
    pub active_only: bool,
}
