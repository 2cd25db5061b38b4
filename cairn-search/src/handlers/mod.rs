//! Typed query handlers.
//!
//! Each handler receives only the dependencies and context it needs and returns a ranked
//! [`Candidate`] list. None of them raise: a dependency failure (graph down, embedder down)
//! degrades to an empty or partial result, and the orchestrator falls through to the RRF pool when
//! a handler comes back empty.

pub mod aspect_query;
pub mod entity_lookup;
pub mod exploratory;
pub mod relationship;
pub mod temporal;

use cairn_core::Embedder;
use cairn_graph::traits::knowledge_graph::GraphProvider;
use cairn_graph::types::Entity;
use std::collections::HashSet;
use std::sync::Arc;

/// Resolve free-text entity hints to graph entities by embedding similarity, deduplicated by uuid (
/// "resolve entity_hints by similarity (top 5 each, dedup by uuid)"). Soft-fails per-hint on
/// embedder error.
pub async fn resolve_hints(
    graph: &Arc<dyn GraphProvider>,
    embedder: &Arc<dyn Embedder>,
    hints: &[String],
    project: &str,
) -> Vec<Entity> {
    const PER_HINT_LIMIT: usize = 5;
    let mut seen = HashSet::new();
    let mut resolved = Vec::new();
    for hint in hints {
        let Ok(embedding) = embedder.embed(hint).await else { continue };
        for entity in graph.search_entities_by_embedding(&embedding, project, PER_HINT_LIMIT).await {
            if seen.insert(entity.id) {
                resolved.push(entity);
            }
        }
    }
    resolved
}
