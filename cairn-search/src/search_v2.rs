//! `SearchV2`: the single external entry point.
//!
//! Passthrough mode is a direct delegate to [`SearchEngine`]; enhanced mode layers routing, handler
//! dispatch, reranking, and token-budget trimming on top, and degrades back to the passthrough
//! result on any internal error.

use crate::engine::{tokenize, SearchEngine};
use crate::error::Result;
use crate::handlers::{aspect_query::handle_aspect_query, entity_lookup::handle_entity_lookup, exploratory::handle_exploratory, relationship::handle_relationship, resolve_hints, temporal::handle_temporal};
use crate::reranker::{rerank, RerankCandidate, Reranker};
use crate::router::QueryRouter;
use crate::types::{Candidate, QueryType, SearchMode, SearchRequest, SearchResult};
use cairn_core::Embedder;
use cairn_graph::traits::knowledge_graph::GraphProvider;
use cairn_memory::types::Memory;
use cairn_storage::Storage;
use std::collections::HashMap;
use std::sync::Arc;

/// Tunables surfaced through configuration.
#[derive(Debug, Clone)]
pub struct SearchV2Config {
    pub enhanced_enabled: bool,
    pub rerank_enabled: bool,
    pub rerank_candidates: usize,
    pub token_budget: usize,
}

impl Default for SearchV2Config {
    fn default() -> Self {
        Self { enhanced_enabled: true, rerank_enabled: false, rerank_candidates: 50, token_budget: 10_000 }
    }
}

pub struct SearchV2 {
    engine: Arc<SearchEngine>,
    router: Option<Arc<QueryRouter>>,
    graph: Option<Arc<dyn GraphProvider>>,
    embedder: Arc<dyn Embedder>,
    storage: Arc<dyn Storage>,
    reranker: Option<Arc<dyn Reranker>>,
    config: SearchV2Config,
}

impl SearchV2 {
    #[must_use]
    pub fn new(
        engine: Arc<SearchEngine>,
        router: Option<Arc<QueryRouter>>,
        graph: Option<Arc<dyn GraphProvider>>,
        embedder: Arc<dyn Embedder>,
        storage: Arc<dyn Storage>,
        reranker: Option<Arc<dyn Reranker>>,
        config: SearchV2Config,
    ) -> Self {
        Self { engine, router, graph, embedder, storage, reranker, config }
    }

    /// Never raises: enhanced-mode failures degrade to the passthrough result.
    pub async fn search(&self, request: &SearchRequest) -> Vec<SearchResult> {
        if !self.config.enhanced_enabled || !matches!(request.mode, SearchMode::Semantic) {
            return self.engine.search(request).await;
        }

        match self.search_enhanced(request).await {
            Ok(results) => results,
            Err(err) => {
                tracing::warn!(error = %err, "enhanced search failed, falling back to passthrough");
                self.engine.search(request).await
            }
        }
    }

    async fn search_enhanced(&self, request: &SearchRequest) -> Result<Vec<SearchResult>> {
        let rrf_pool = self.engine.fuse_candidates(request).await;
        let rrf_pool = top_n(rrf_pool, self.config.rerank_candidates);

        let route = match &self.router {
            Some(router) => router.route(&request.query).await,
            None => crate::types::Route::fallback(),
        };

        let dispatch_eligible = route.should_dispatch()
            && (route.query_type.is_entity_anchored() || matches!(route.query_type, QueryType::Temporal));

        let blended = if dispatch_eligible {
            let hints = if route.entity_hints.is_empty() { extract_query_entities(&request.query) } else { route.entity_hints.clone() };
            let project = request.filters.single_project().unwrap_or_default();
            let handler_candidates = self.dispatch_handler(&route, &hints, project, request).await;
            blend(handler_candidates, rrf_pool)
        } else {
            rrf_pool
        };

        let reranked = if self.config.rerank_enabled && self.reranker.is_some() {
            self.maybe_rerank(&request.query, blended, request.limit).await?
        } else {
            top_n(blended, request.limit)
        };

        let trimmed = self.apply_token_budget(reranked, request).await?;
        Ok(trimmed)
    }

    async fn dispatch_handler(&self, route: &crate::types::Route, hints: &[String], project: &str, request: &SearchRequest) -> Vec<Candidate> {
        let Some(graph) = &self.graph else { return Vec::new() };

        match route.query_type {
            QueryType::EntityLookup => {
                let resolved = resolve_hints(graph, &self.embedder, hints, project).await;
                handle_entity_lookup(graph, &self.embedder, hints, project, Some(&resolved)).await
            }
            QueryType::AspectQuery => {
                handle_aspect_query(&self.storage, graph, &self.embedder, &request.query, &route.aspects, hints, project, request.limit).await
            }
            QueryType::Temporal => handle_temporal(&self.storage, &route.temporal, project).await,
            QueryType::Relationship => handle_relationship(graph, &self.embedder, hints, project).await,
            QueryType::Exploratory => {
                handle_exploratory(&self.storage, graph, &self.embedder, &request.query, hints, project, request.limit).await
            }
        }
    }

    async fn maybe_rerank(&self, query: &str, candidates: Vec<Candidate>, limit: usize) -> Result<Vec<Candidate>> {
        let Some(reranker) = &self.reranker else { return Ok(top_n(candidates, limit)) };
        let capped = top_n(candidates, self.config.rerank_candidates);
        if capped.is_empty() {
            return Ok(capped);
        }

        let ids: Vec<i64> = capped.iter().map(|c| c.memory_id).collect();
        let memories = self.engine.recall(&ids).await?;
        let by_id: HashMap<i64, &Memory> = memories.iter().map(|m| (m.id, m)).collect();

        let rerank_inputs: Vec<RerankCandidate> = capped
            .iter()
            .filter_map(|c| {
                let memory = by_id.get(&c.memory_id)?;
                Some(RerankCandidate { memory_id: c.memory_id, text: memory.content.clone(), score: c.score, rerank_score: None })
            })
            .collect();

        let reranked = rerank(reranker.as_ref(), query, rerank_inputs, limit).await;

        Ok(reranked
            .into_iter()
            .map(|r| {
                let mut candidate = Candidate::new(r.memory_id, r.score);
                candidate.rerank_score = r.rerank_score;
                candidate
            })
            .collect())
    }

    /// Token-budget trimming on assembly: accumulate estimated tokens until the budget would be
    /// exceeded, drop the tail, but always keep at least one item (spec §4.9 step 5). The
    /// memory-type filter (step 6) runs only *after* the trim, since it was "not propagated to the
    /// graph path" -- wrong-type candidates must still consume budget before being dropped.
    async fn apply_token_budget(&self, candidates: Vec<Candidate>, request: &SearchRequest) -> Result<Vec<SearchResult>> {
        let projected = self.engine.project_all(candidates, request).await?;
        let trimmed = trim_to_budget(projected, self.config.token_budget);
        Ok(trimmed.into_iter().filter(|r| request.filters.matches_type(r.memory_type.as_str())).collect())
    }
}

/// Blend handler output with the RRF pool: handler-first, dedup by id, sort by score descending.
fn blend(handler_candidates: Vec<Candidate>, rrf_pool: Vec<Candidate>) -> Vec<Candidate> {
    if handler_candidates.is_empty() {
        return rrf_pool;
    }
    let mut seen = std::collections::HashSet::new();
    let mut merged = Vec::with_capacity(handler_candidates.len() + rrf_pool.len());
    for candidate in handler_candidates.into_iter().chain(rrf_pool) {
        if seen.insert(candidate.memory_id) {
            merged.push(candidate);
        }
    }
    merged.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal).then(a.memory_id.cmp(&b.memory_id)));
    merged
}

fn top_n(mut candidates: Vec<Candidate>, n: usize) -> Vec<Candidate> {
    candidates.truncate(n);
    candidates
}

/// Trim to the token budget, always keeping at least one item when any candidate existed.
fn trim_to_budget(results: Vec<SearchResult>, budget: usize) -> Vec<SearchResult> {
    let mut out = Vec::with_capacity(results.len());
    let mut spent = 0usize;
    for (i, result) in results.into_iter().enumerate() {
        let text = result.content.as_deref().unwrap_or(&result.summary);
        let tokens = cairn_core::types::estimate_tokens(text);
        if i > 0 && spent + tokens > budget {
            break;
        }
        spent += tokens;
        out.push(result);
    }
    out
}

/// A small stop-word set for the content-word fallback below.
const STOP_WORDS: &[&str] = &["what", "which", "that", "this", "with", "from", "about", "have", "were", "they", "them", "does", "when", "where"];

/// Proper-noun extraction heuristic for entity-anchored queries: capitalized terms past the first
/// word, adjacent capitalized bigrams, and the full query string; falls back to content words ≥ 4
/// chars outside a small stop-word set if none are found.
#[must_use]
pub fn extract_query_entities(query: &str) -> Vec<String> {
    let words: Vec<&str> = query.split_whitespace().collect();
    let mut hints = Vec::new();

    let is_capitalized = |w: &str| w.chars().next().is_some_and(char::is_uppercase);

    for (i, word) in words.iter().enumerate().skip(1) {
        let cleaned = word.trim_matches(|c: char| !c.is_alphanumeric());
        if !cleaned.is_empty() && is_capitalized(cleaned) {
            hints.push(cleaned.to_string());
        }
        if i + 1 < words.len() {
            let next = words[i + 1].trim_matches(|c: char| !c.is_alphanumeric());
            if is_capitalized(cleaned) && !next.is_empty() && is_capitalized(next) {
                hints.push(format!("{cleaned} {next}"));
            }
        }
    }

    if hints.is_empty() {
        hints = tokenize(query).into_iter().filter(|w| w.chars().count() >= 4 && !STOP_WORDS.contains(&w.as_str())).collect();
    }

    // The full query string is always a candidate hint, regardless of which branch above ran.
    hints.push(query.to_string());
    dedup_preserve_order(hints)
}

fn dedup_preserve_order(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items.into_iter().filter(|i| seen.insert(i.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SearchResult;
    use chrono::Utc;

    fn result(id: i64, content_len: usize) -> SearchResult {
        result_typed(id, content_len, "note")
    }

    fn result_typed(id: i64, content_len: usize, memory_type: &str) -> SearchResult {
        SearchResult {
            id,
            content: Some("x".repeat(content_len)),
            summary: String::new(),
            memory_type: memory_type.to_string(),
            importance: 0.5,
            project: "p".to_string(),
            tags: Vec::new(),
            auto_tags: Vec::new(),
            created_at: Utc::now(),
            score: 1.0,
            rerank_score: None,
        }
    }

    #[test]
    fn trim_keeps_at_least_one_even_if_oversized() {
        let results = vec![result(1, 100_000)];
        let trimmed = trim_to_budget(results, 10);
        assert_eq!(trimmed.len(), 1);
    }

    #[test]
    fn trim_drops_tail_past_budget() {
        let results = vec![result(1, 100), result(2, 100), result(3, 100_000)];
        let trimmed = trim_to_budget(results, 60);
        assert_eq!(trimmed.len(), 2);
    }

    /// Spec §4.9 steps 5-6: the token budget must consume wrong-type candidates before the
    /// memory-type filter drops them, not the other way around. A wrong-type item large enough to
    /// exhaust the budget on its own should starve the right-type items behind it.
    #[test]
    fn budget_trim_runs_before_type_filter() {
        let results = vec![
            result_typed(1, 24_000, "code-snippet"), // 6000 tokens, wrong type
            result_typed(2, 20_000, "note"),          // 5000 tokens, right type
            result_typed(3, 20_000, "note"),          // 5000 tokens, right type
        ];
        let trimmed = trim_to_budget(results, 10_000);
        assert_eq!(trimmed.len(), 1, "only the first (wrong-type) item fits the budget");

        let filters = crate::types::SearchFilters { projects: None, memory_types: Some(vec!["note".to_string()]) };
        let filtered: Vec<_> = trimmed.into_iter().filter(|r| filters.matches_type(&r.memory_type)).collect();
        assert!(filtered.is_empty(), "the wrong-type item already consumed the budget and is now dropped");
    }

    #[test]
    fn extract_query_entities_finds_capitalized_bigram() {
        let hints = extract_query_entities("what is Alice Smith working on");
        assert!(hints.iter().any(|h| h == "Alice Smith"));
    }

    #[test]
    fn extract_query_entities_falls_back_to_content_words() {
        let hints = extract_query_entities("what happened yesterday");
        assert!(hints.iter().any(|h| h == "happened" || h == "yesterday"));
    }

    #[test]
    fn extract_query_entities_always_includes_full_query() {
        let hints = extract_query_entities("how does deployment work?");
        assert!(hints.contains(&"how does deployment work?".to_string()));
    }

    #[test]
    fn blend_is_handler_first_deduped_and_sorted() {
        let handler = vec![Candidate::new(2, 5.0), Candidate::new(1, 1.0)];
        let rrf = vec![Candidate::new(1, 9.0), Candidate::new(3, 0.5)];
        let blended = blend(handler, rrf);
        let ids: Vec<i64> = blended.iter().map(|c| c.memory_id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }
}
