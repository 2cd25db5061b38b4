//! `GraphProvider`: the knowledge-graph primitives the retrieval pipeline depends on.
//!
//! Entity <-> Statement is bipartite by construction — statements reference entities via triples,
//! entities never reference statements directly — so every traversal here walks that bipartite
//! adjacency with a hard depth cap.

use crate::error::Result;
use crate::types::{Aspect, Entity, EntityType, GraphVisualization, Statement};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;

/// Default cosine-similarity threshold above which two entities of the same type are considered the
/// same real-world thing and merged. Exposed as a default so callers/tests can override it; `cairn-
/// config` surfaces it as a tunable.
pub const DEFAULT_MERGE_THRESHOLD: f32 = 0.80;

/// Default bound on `find_similar_entities` result sets.
pub const MAX_SIMILAR_ENTITIES: usize = 5;

/// Default BFS depth for `handle_entity_lookup`'s hop-2 traversal.
pub const DEFAULT_ENTITY_LOOKUP_HOP_DEPTH: usize = 2;

/// Default BFS depth bound for `find_connecting_statements`.
pub const DEFAULT_RELATIONSHIP_BFS_DEPTH: usize = 3;

/// Knowledge-graph primitives consumed by `KnowledgeExtractor` and the
/// search handlers.
#[async_trait]
pub trait GraphProvider: Send + Sync {
    /// Create a new entity and return its id.
    async fn create_entity(
        &self,
        name: &str,
        entity_type: EntityType,
        embedding: Vec<f32>,
        project: &str,
        attributes: HashMap<String, String>,
    ) -> Result<Uuid>;

    /// Entities of `entity_type` in `project` whose name-embedding cosine
    /// similarity to `embedding` exceeds the merge threshold, deduplicated
    /// by id, bounded at [`MAX_SIMILAR_ENTITIES`]. Returns an empty vec
    /// (not an error) if the backend is unreachable.
    async fn find_similar_entities(
        &self,
        embedding: &[f32],
        entity_type: EntityType,
        project: &str,
    ) -> Vec<Entity>;

    /// Pure similarity search over entities, independent of a merge
    /// threshold (used for resolving query entity hints).
    async fn search_entities_by_embedding(
        &self,
        embedding: &[f32],
        project: &str,
        limit: usize,
    ) -> Vec<Entity>;

    /// Create a new statement and return its id. `fact` is truncated to
    /// [`crate::types::MAX_FACT_WORDS`] words by [`crate::types::Statement::new`].
    async fn create_statement(
        &self,
        fact: &str,
        embedding: Vec<f32>,
        aspect: Aspect,
        episode_id: i64,
        project: &str,
        valid_at: DateTime<Utc>,
    ) -> Result<Uuid>;

    /// Record a (subject, predicate, object) edge for `statement_id`.
    /// Exactly one of `object_id`/`object_literal` must be `Some`.
    async fn create_triple(
        &self,
        statement_id: Uuid,
        subject_id: Uuid,
        predicate: &str,
        object_id: Option<Uuid>,
        object_literal: Option<String>,
    ) -> Result<()>;

    /// Active statements sharing `(subject_id, predicate)` with a
    /// newly-extracted fact — candidates for invalidation.
    async fn find_contradictions(
        &self,
        subject_id: Uuid,
        predicate: &str,
        project: &str,
    ) -> Vec<Statement>;

    /// Mark a statement inactive. Does not delete it.
    async fn invalidate_statement(&self, id: Uuid, invalidated_by: &str) -> Result<()>;

    /// Episode (memory) ids that mention `entity_id` via any statement.
    async fn find_entity_episodes(&self, entity_id: Uuid) -> Vec<i64>;

    /// Active statements about `entity_id`, optionally filtered to a subset
    /// of aspects.
    async fn find_entity_statements(&self, entity_id: Uuid, aspects: Option<&[Aspect]>) -> Vec<Statement>;

    /// Statements on a bipartite path between two entities, bounded at
    /// [`DEFAULT_RELATIONSHIP_BFS_DEPTH`] hops.
    async fn find_connecting_statements(&self, a: Uuid, b: Uuid) -> Vec<Statement>;

    /// All statements reachable from `start` within `max_depth` hops over
    /// the bipartite Entity<->Statement adjacency. `max_depth` is hard
    /// capped at [`DEFAULT_RELATIONSHIP_BFS_DEPTH`] regardless of the
    /// caller's request.
    async fn bfs_traverse(&self, start: Uuid, max_depth: usize) -> Vec<Statement>;

    /// Episode ids carrying statements in any of `aspects`, within `project`.
    async fn search_statements_by_aspect(&self, aspects: &[Aspect], project: &str) -> Vec<i64>;

    /// Snapshot for UI/browse use; not on the critical search path.
    async fn get_knowledge_graph_visualization(
        &self,
        project: &str,
        entity_types: Option<&[EntityType]>,
        limit: usize,
    ) -> GraphVisualization;
}
