//! Backend-agnostic storage contract.

use crate::error::Result;
use crate::model::{EventRow, MemoryFilter, MemoryRow, NewMemoryRow, RelationRow};
use async_trait::async_trait;

/// Relational + vector storage for memories, relations, and the enrichment
/// outbox. Implementations back `cairn-memory::MemoryStore` and the search
/// pipeline's candidate fetchers.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn ensure_project(&self, name: &str) -> Result<()>;

    async fn insert_memory(&self, row: NewMemoryRow) -> Result<i64>;

    async fn get_memory(&self, id: i64) -> Result<Option<MemoryRow>>;

    async fn update_memory(&self, row: &MemoryRow) -> Result<()>;

    async fn list_memories(&self, filter: &MemoryFilter) -> Result<Vec<MemoryRow>>;

    /// Brute-force cosine-similarity ranking over active memories' embeddings,
    /// returned as `(memory_id, score)` descending by score. `project = None`
    /// searches every project (the "all projects" search mode); `Some(name)`
    /// is a hard filter to that project.
    async fn vector_search(
        &self,
        project: Option<&str>,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<(i64, f32)>>;

    /// `FTS`-less keyword match: any memory whose content, summary, or tags
    /// contain one of `terms` (case-insensitive), most-recently-updated
    /// first. `project = None` searches every project.
    async fn keyword_search(&self, project: Option<&str>, terms: &[String], limit: usize) -> Result<Vec<i64>>;

    async fn insert_relation(&self, relation: RelationRow) -> Result<()>;

    async fn list_relations(&self, memory_id: i64) -> Result<Vec<RelationRow>>;

    async fn enqueue_event(&self, topic: &str, payload: serde_json::Value) -> Result<i64>;

    async fn fetch_undelivered_events(&self, limit: usize) -> Result<Vec<EventRow>>;

    async fn mark_event_delivered(&self, id: i64) -> Result<()>;

    async fn increment_event_attempts(&self, id: i64) -> Result<()>;

    /// Insert a memory and enqueue its event in the same transaction, so a crash between the write
    /// and the publish is impossible: either both land, or neither does. The memory id isn't known
    /// until the insert completes, so the event envelope is built from it via `build_payload` rather
    /// than passed in ready-made. Returns `(memory_id, event_id)`.
    async fn insert_memory_with_event(
        &self,
        row: NewMemoryRow,
        topic: &str,
        build_payload: &(dyn Fn(i64) -> serde_json::Value + Send + Sync),
    ) -> Result<(i64, i64)>;

    /// Apply a memory update and enqueue its event in the same transaction. Returns the event id.
    async fn update_memory_with_event(&self, row: &MemoryRow, topic: &str, payload: serde_json::Value) -> Result<i64>;
}
