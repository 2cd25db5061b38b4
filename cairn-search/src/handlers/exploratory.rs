//! `handle_exploratory`.

use super::resolve_hints;
use crate::types::Candidate;
use cairn_core::Embedder;
use cairn_graph::traits::knowledge_graph::GraphProvider;
use cairn_storage::Storage;
use std::collections::HashMap;
use std::sync::Arc;

const VECTOR_SCORE_OFFSET: f64 = 10.0;

pub async fn handle_exploratory(
    storage: &Arc<dyn Storage>,
    graph: &Arc<dyn GraphProvider>,
    embedder: &Arc<dyn Embedder>,
    query: &str,
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

    if !entity_hints.is_empty() {
        let resolved = resolve_hints(graph, embedder, entity_hints, project).await;
        let mut next_rank = order.len();
        for entity in &resolved {
            for episode_id in graph.find_entity_episodes(entity.id).await {
                if !score_by_id.contains_key(&episode_id) {
                    next_rank += 1;
                    score_by_id.insert(episode_id, 1.0 / (next_rank as f64 + 1.0));
                    order.push(episode_id);
                }
            }
        }
    }

    order.into_iter().map(|id| Candidate::new(id, score_by_id[&id])).collect()
}
