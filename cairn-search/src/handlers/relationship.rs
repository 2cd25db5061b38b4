//! `handle_relationship`.

use crate::types::Candidate;
use cairn_core::Embedder;
use cairn_graph::traits::knowledge_graph::GraphProvider;
use std::collections::HashSet;
use std::sync::Arc;

/// Requires at least 2 resolved hints; returns empty otherwise so the orchestrator falls through to
/// the RRF pool.
///
/// Resolves only the first two hints, at one entity each -- unlike `resolve_hints`'s top-5-per-hint
/// used by the other handlers. Resolving every hint at 5-each here would risk the first hint's top-2
/// near-duplicate matches (e.g. two "Alice" entities above the merge threshold) standing in for the
/// two distinct entities the query meant to connect.
pub async fn handle_relationship(
    graph: &Arc<dyn GraphProvider>,
    embedder: &Arc<dyn Embedder>,
    entity_hints: &[String],
    project: &str,
) -> Vec<Candidate> {
    let mut resolved_ids = Vec::new();
    for hint in entity_hints.iter().take(2) {
        let Ok(embedding) = embedder.embed(hint).await else { continue };
        if let Some(entity) = graph.search_entities_by_embedding(&embedding, project, 1).await.into_iter().next() {
            resolved_ids.push(entity.id);
        }
    }
    if resolved_ids.len() < 2 {
        return Vec::new();
    }

    let statements = graph.find_connecting_statements(resolved_ids[0], resolved_ids[1]).await;

    let mut seen = HashSet::new();
    let mut episode_ids = Vec::new();
    for statement in statements {
        if seen.insert(statement.episode_id) {
            episode_ids.push(statement.episode_id);
        }
    }

    episode_ids.into_iter().enumerate().map(|(i, episode_id)| Candidate::new(episode_id, 1.0 / (i as f64 + 1.0))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use cairn_graph::error::Result as GraphResult;
    use cairn_graph::types::{Aspect, Entity, EntityType, GraphVisualization, Statement};
    use chrono::{DateTime, Utc};
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use uuid::Uuid;

    struct FakeEmbedder;

    #[async_trait]
    impl Embedder for FakeEmbedder {
        fn dimensions(&self) -> usize {
            4
        }
        fn name(&self) -> &str {
            "fake"
        }
        async fn embed(&self, _text: &str) -> cairn_core::Result<Vec<f32>> {
            Ok(vec![1.0, 0.0, 0.0, 0.0])
        }
    }

    fn entity(name: &str) -> Entity {
        Entity::new(name, EntityType::Person, vec![1.0, 0.0, 0.0, 0.0], "proj", HashMap::new())
    }

    /// Records the `limit` passed to every `search_entities_by_embedding` call (in order) and the
    /// pair passed to `find_connecting_statements`, to pin down exactly which hints get resolved and
    /// at what width.
    #[derive(Default)]
    struct RecordingGraph {
        search_limits: Mutex<Vec<usize>>,
        connecting_pair: Mutex<Option<(Uuid, Uuid)>>,
        entities: Vec<Entity>,
    }

    #[async_trait]
    impl GraphProvider for RecordingGraph {
        async fn create_entity(&self, _: &str, _: EntityType, _: Vec<f32>, _: &str, _: HashMap<String, String>) -> GraphResult<Uuid> {
            unreachable!("not exercised by handle_relationship")
        }
        async fn find_similar_entities(&self, _: &[f32], _: EntityType, _: &str) -> Vec<Entity> {
            Vec::new()
        }
        async fn search_entities_by_embedding(&self, _: &[f32], _: &str, limit: usize) -> Vec<Entity> {
            let mut calls = self.search_limits.lock();
            let call_index = calls.len();
            calls.push(limit);
            self.entities.get(call_index).cloned().into_iter().collect()
        }
        async fn create_statement(&self, _: &str, _: Vec<f32>, _: Aspect, _: i64, _: &str, _: DateTime<Utc>) -> GraphResult<Uuid> {
            unreachable!()
        }
        async fn create_triple(&self, _: Uuid, _: Uuid, _: &str, _: Option<Uuid>, _: Option<String>) -> GraphResult<()> {
            unreachable!()
        }
        async fn find_contradictions(&self, _: Uuid, _: &str, _: &str) -> Vec<Statement> {
            Vec::new()
        }
        async fn invalidate_statement(&self, _: Uuid, _: &str) -> GraphResult<()> {
            Ok(())
        }
        async fn find_entity_episodes(&self, _: Uuid) -> Vec<i64> {
            Vec::new()
        }
        async fn find_entity_statements(&self, _: Uuid, _: Option<&[Aspect]>) -> Vec<Statement> {
            Vec::new()
        }
        async fn find_connecting_statements(&self, a: Uuid, b: Uuid) -> Vec<Statement> {
            *self.connecting_pair.lock() = Some((a, b));
            Vec::new()
        }
        async fn bfs_traverse(&self, _: Uuid, _: usize) -> Vec<Statement> {
            Vec::new()
        }
        async fn search_statements_by_aspect(&self, _: &[Aspect], _: &str) -> Vec<i64> {
            Vec::new()
        }
        async fn get_knowledge_graph_visualization(&self, _: &str, _: Option<&[EntityType]>, _: usize) -> GraphVisualization {
            GraphVisualization::default()
        }
    }

    #[tokio::test]
    async fn resolves_only_first_two_hints_at_limit_one() {
        let recording = Arc::new(RecordingGraph {
            entities: vec![entity("Alice"), entity("Bob"), entity("Carol")],
            ..Default::default()
        });
        let graph: Arc<dyn GraphProvider> = Arc::clone(&recording) as Arc<dyn GraphProvider>;
        let embedder: Arc<dyn Embedder> = Arc::new(FakeEmbedder);

        let _ = handle_relationship(&graph, &embedder, &["Alice".into(), "Bob".into(), "Carol".into()], "proj").await;

        assert_eq!(*recording.search_limits.lock(), vec![1, 1], "only the first two hints are resolved, at one entity each");
        let (a, b) = recording.connecting_pair.lock().expect("find_connecting_statements should have run");
        assert_ne!(a, b, "the two resolved entities must be distinct");
    }

    #[tokio::test]
    async fn fewer_than_two_resolved_hints_returns_empty() {
        let recording = Arc::new(RecordingGraph { entities: vec![entity("Solo")], ..Default::default() });
        let graph: Arc<dyn GraphProvider> = Arc::clone(&recording) as Arc<dyn GraphProvider>;
        let embedder: Arc<dyn Embedder> = Arc::new(FakeEmbedder);

        let candidates = handle_relationship(&graph, &embedder, &["Solo".to_string()], "proj").await;
        assert!(candidates.is_empty());
    }
}
