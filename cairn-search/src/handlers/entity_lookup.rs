//! `handle_entity_lookup`.

use super::resolve_hints;
use crate::types::Candidate;
use cairn_core::Embedder;
use cairn_graph::traits::knowledge_graph::{GraphProvider, DEFAULT_ENTITY_LOOKUP_HOP_DEPTH};
use cairn_graph::types::Entity;
use std::collections::HashMap;
use std::sync::Arc;

const HOP1_BASE_SCORE: f64 = 2.0;
const HOP2_BASE_SCORE: f64 = 1.3;

/// `resolved` lets the orchestrator pass already-resolved entities; `None` falls back to resolving
/// `entity_hints` here.
pub async fn handle_entity_lookup(
    graph: &Arc<dyn GraphProvider>,
    embedder: &Arc<dyn Embedder>,
    entity_hints: &[String],
    project: &str,
    resolved: Option<&[Entity]>,
) -> Vec<Candidate> {
    let owned;
    let entities: &[Entity] = match resolved {
        Some(e) => e,
        None => {
            owned = resolve_hints(graph, embedder, entity_hints, project).await;
            &owned
        }
    };
    if entities.is_empty() {
        return Vec::new();
    }

    // hop 1: direct episodes. hop 1 wins ties with hop 2 by inserting first.
    let mut episode_scores: HashMap<i64, f64> = HashMap::new();
    for entity in entities {
        for episode_id in graph.find_entity_episodes(entity.id).await {
            episode_scores.entry(episode_id).or_insert(HOP1_BASE_SCORE);
        }
    }

    // hop 2: statements reached via bipartite BFS from each entity.
    for entity in entities {
        for statement in graph.bfs_traverse(entity.id, DEFAULT_ENTITY_LOOKUP_HOP_DEPTH).await {
            episode_scores.entry(statement.episode_id).or_insert(HOP2_BASE_SCORE);
        }
    }

    let mut ranked: Vec<(i64, f64)> = episode_scores.into_iter().collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal).then(a.0.cmp(&b.0)));

    ranked
        .into_iter()
        .enumerate()
        .map(|(i, (episode_id, hop_score))| {
            let row_score = 1.0 / (i as f64 + 1.0);
            Candidate::new(episode_id, hop_score * row_score)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hop1_outscores_hop2_at_same_rank() {
        assert!(HOP1_BASE_SCORE > HOP2_BASE_SCORE);
    }
}
