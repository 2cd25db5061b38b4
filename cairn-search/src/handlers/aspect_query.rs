//! `handle_aspect_query`.

use super::resolve_hints;
use crate::types::Candidate;
use cairn_core::Embedder;
use cairn_graph::traits::knowledge_graph::GraphProvider;
use cairn_graph::types::Aspect;
use cairn_storage::Storage;
use std::collections::HashMap;
use std::sync::Arc;

/// Vector search is the spine (wide pool `limit * 3`); entity-statement or aspect-index supplements
/// are appended after, deduped by id. Supplement scores are kept strictly below the vector spine's
/// so the "vector-first" ordering holds regardless of raw cosine magnitude.
const VECTOR_SCORE_OFFSET: f64 = 10.0;

#[allow(clippy::too_many_arguments)]
pub async fn handle_aspect_query(
    storage: &Arc<dyn Storage>,
    graph: &Arc<dyn GraphProvider>,
    embedder: &Arc<dyn Embedder>,
    query: &str,
    aspects: &[Aspect],
    entity_hints: &[String],
    project: &str,
    limit: usize,
) -> Vec<Candidate> {
    let pool = limit.saturating_mul(3).max(1);
    let mut order: Vec<i64> = Vec::new();
    let mut score_by_id: HashMap<i64, f64> = HashMap::new();

    if let Ok(embedding) = embedder.embed(query).await {
        if let Ok(ranked) = storage.vector_search(Some(project), &embedding, pool).await {
            for (id, cosine) in ranked {
                if score_by_id.insert(id, f64::from(cosine) + VECTOR_SCORE_OFFSET).is_none() {
                    order.push(id);
                }
            }
        }
    }

    let supplement_episode_ids: Vec<i64> = if entity_hints.is_empty() {
        graph.search_statements_by_aspect(aspects, project).await.into_iter().take(limit).collect()
    } else {
        let resolved = resolve_hints(graph, embedder, entity_hints, project).await;
        let mut ids = Vec::new();
        for entity in &resolved {
            for statement in graph.find_entity_statements(entity.id, Some(aspects)).await {
                ids.push(statement.episode_id);
            }
        }
        ids
    };

    let mut next_rank = order.len();
    for id in supplement_episode_ids {
        if !score_by_id.contains_key(&id) {
            next_rank += 1;
            score_by_id.insert(id, 1.0 / (next_rank as f64 + 1.0));
            order.push(id);
        }
    }

    order.into_iter().map(|id| Candidate::new(id, score_by_id[&id])).collect()
}
