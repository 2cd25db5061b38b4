//! The baseline RRF hybrid ranker.
//!
//! Runs the three signals in parallel, fuses them, and recalls full rows. `SearchEngine::search`
//! never raises -- a failure at any stage degrades to an empty signal (or, in the worst case, an
//! empty result list) rather than propagating, since `SearchEngine` sits at the bottom of the
//! fallback chain.

use crate::error::Result;
use crate::rrf::{fuse, SIGNAL_KEYWORD, SIGNAL_POOL_CAP, SIGNAL_TAG, SIGNAL_VECTOR, WEIGHT_KEYWORD, WEIGHT_TAG, WEIGHT_VECTOR};
use crate::types::{Candidate, SearchMode, SearchRequest, SearchResult};
use cairn_core::Embedder;
use cairn_memory::store::MemoryStore;
use cairn_storage::{MemoryFilter, Storage};
use std::sync::Arc;

/// A small stop-word-free tokenizer: lowercase words of 2+ chars. Shared by
/// the keyword signal and the orchestrator's entity-extraction fallback.
#[must_use]
pub fn tokenize(query: &str) -> Vec<String> {
    query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= 2)
        .map(str::to_lowercase)
        .collect()
}

/// The resolved project scope for a request. `Storage` only filters to zero-or-one project per
/// call, so `Many` is fanned out here and merged.
enum ProjectScope<'a> {
    All,
    One(&'a str),
    Many(&'a [String]),
}

impl<'a> ProjectScope<'a> {
    fn resolve(filters: &'a crate::types::SearchFilters) -> Self {
        match filters.projects.as_deref() {
            None | Some([]) => Self::All,
            Some([only]) => Self::One(only.as_str()),
            Some(many) => Self::Many(many),
        }
    }
}

pub struct SearchEngine {
    storage: Arc<dyn Storage>,
    memory_store: Arc<dyn MemoryStore>,
    embedder: Arc<dyn Embedder>,
}

impl SearchEngine {
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>, memory_store: Arc<dyn MemoryStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self { storage, memory_store, embedder }
    }

    /// Run the signals, fuse, recall rows, and project into the output
    /// schema. Never raises: any internal error degrades to `vec![]`.
    pub async fn search(&self, request: &SearchRequest) -> Vec<SearchResult> {
        match self.search_fallible(request).await {
            Ok(results) => results,
            Err(err) => {
                tracing::warn!(error = %err, "search engine degraded to empty result");
                Vec::new()
            }
        }
    }

    async fn search_fallible(&self, request: &SearchRequest) -> Result<Vec<SearchResult>> {
        let candidates = self.fuse_candidates(request).await;
        self.project(candidates, request).await
    }

    /// The fusion step alone, exposed for the orchestrator to build its RRF candidate pool before
    /// blending in a handler.
    pub async fn fuse_candidates(&self, request: &SearchRequest) -> Vec<Candidate> {
        let scope = ProjectScope::resolve(&request.filters);

        let vector_ids = if matches!(request.mode, SearchMode::Semantic) {
            self.vector_signal(&scope, &request.query).await
        } else {
            Vec::new()
        };

        let keyword_ids = if matches!(request.mode, SearchMode::Semantic | SearchMode::Keyword) {
            self.keyword_signal(&scope, &request.query).await
        } else {
            Vec::new()
        };

        let tag_ids = if matches!(request.mode, SearchMode::Semantic | SearchMode::Tag) {
            self.tag_signal(&scope, &request.query).await
        } else {
            Vec::new()
        };

        let signals: Vec<(&'static str, f64, &[i64])> = vec![
            (SIGNAL_VECTOR, WEIGHT_VECTOR, vector_ids.as_slice()),
            (SIGNAL_KEYWORD, WEIGHT_KEYWORD, keyword_ids.as_slice()),
            (SIGNAL_TAG, WEIGHT_TAG, tag_ids.as_slice()),
        ];
        fuse(&signals)
    }

    async fn vector_signal(&self, scope: &ProjectScope<'_>, query: &str) -> Vec<i64> {
        let embedding = match self.embedder.embed(query).await {
            Ok(e) => e,
            Err(err) => {
                tracing::warn!(error = %err, "embedder unavailable, vector signal empty");
                return Vec::new();
            }
        };

        let mut ranked: Vec<(i64, f32)> = match scope {
            ProjectScope::All => self.storage.vector_search(None, &embedding, SIGNAL_POOL_CAP).await.unwrap_or_default(),
            ProjectScope::One(project) => {
                self.storage.vector_search(Some(project), &embedding, SIGNAL_POOL_CAP).await.unwrap_or_default()
            }
            ProjectScope::Many(projects) => {
                let mut merged = Vec::new();
                for project in *projects {
                    merged.extend(self.storage.vector_search(Some(project), &embedding, SIGNAL_POOL_CAP).await.unwrap_or_default());
                }
                merged
            }
        };
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked.truncate(SIGNAL_POOL_CAP);
        ranked.into_iter().map(|(id, _score)| id).collect()
    }

    async fn keyword_signal(&self, scope: &ProjectScope<'_>, query: &str) -> Vec<i64> {
        let terms = tokenize(query);
        if terms.is_empty() {
            return Vec::new();
        }

        let mut ids: Vec<i64> = match scope {
            ProjectScope::All => self.storage.keyword_search(None, &terms, SIGNAL_POOL_CAP).await.unwrap_or_default(),
            ProjectScope::One(project) => {
                self.storage.keyword_search(Some(project), &terms, SIGNAL_POOL_CAP).await.unwrap_or_default()
            }
            ProjectScope::Many(projects) => {
                let mut merged = Vec::new();
                for project in *projects {
                    merged.extend(self.storage.keyword_search(Some(project), &terms, SIGNAL_POOL_CAP).await.unwrap_or_default());
                }
                merged
            }
        };
        ids.truncate(SIGNAL_POOL_CAP);
        ids
    }

    /// Exact user-tag match against query tokens, ranked by match count descending then importance
    /// descending.
    async fn tag_signal(&self, scope: &ProjectScope<'_>, query: &str) -> Vec<i64> {
        let tokens: std::collections::HashSet<String> = tokenize(query).into_iter().collect();
        if tokens.is_empty() {
            return Vec::new();
        }

        let rows = match scope {
            ProjectScope::All => self.list_memories_or_empty(None).await,
            ProjectScope::One(project) => self.list_memories_or_empty(Some((*project).to_string())).await,
            ProjectScope::Many(projects) => {
                let mut merged = Vec::new();
                for project in *projects {
                    merged.extend(self.list_memories_or_empty(Some(project.clone())).await);
                }
                merged
            }
        };

        let mut scored: Vec<(i64, usize, f32)> = rows
            .iter()
            .filter_map(|row| {
                let matched = row.tags.iter().filter(|t| tokens.contains(t.to_lowercase().as_str())).count();
                (matched > 0).then_some((row.id, matched, row.importance))
            })
            .collect();
        scored.sort_by(|a, b| b.1.cmp(&a.1).then(b.2.partial_cmp(&a.2).unwrap_or(std::cmp::Ordering::Equal)));
        scored.truncate(SIGNAL_POOL_CAP);
        scored.into_iter().map(|(id, _, _)| id).collect()
    }

    /// Full rows for a set of memory ids, for callers (the reranker) that
    /// need raw content rather than the projected output schema.
    pub async fn recall(&self, ids: &[i64]) -> Result<Vec<cairn_memory::types::Memory>> {
        Ok(self.memory_store.recall(ids).await?)
    }

    async fn list_memories_or_empty(&self, project: Option<String>) -> Vec<cairn_storage::MemoryRow> {
        let filter = MemoryFilter { project, active_only: true, ..Default::default() };
        match self.storage.list_memories(&filter).await {
            Ok(rows) => rows,
            Err(err) => {
                tracing::warn!(error = %err, "list_memories failed, tag signal partial");
                Vec::new()
            }
        }
    }

    /// Recall full rows for a fused candidate list and project into the public schema, preserving
    /// candidate order and applying neither the memory-type filter nor the `limit` truncation. Used
    /// by `SearchV2` so it can trim to the token budget *before* the memory-type filter runs (spec
    /// §4.9 steps 5-6 run in that order; filtering first would exclude wrong-type candidates from the
    /// budget calculation they're supposed to count against).
    pub async fn project_all(&self, candidates: Vec<Candidate>, request: &SearchRequest) -> Result<Vec<SearchResult>> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i64> = candidates.iter().map(|c| c.memory_id).collect();
        let memories = self.memory_store.recall(&ids).await?;
        let by_id: std::collections::HashMap<i64, _> = memories.into_iter().map(|m| (m.id, m)).collect();

        let mut out = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let Some(memory) = by_id.get(&candidate.memory_id) else { continue };
            out.push(SearchResult::project(memory, candidate.score, candidate.rerank_score, request.include_full));
        }
        Ok(out)
    }

    /// Recall, project, and apply the memory-type filter and `limit` truncation in one step. Used by
    /// the baseline `SearchEngine::search` path, which has no token-budget stage to order the filter
    /// against.
    pub async fn project(&self, candidates: Vec<Candidate>, request: &SearchRequest) -> Result<Vec<SearchResult>> {
        let projected = self.project_all(candidates, request).await?;
        Ok(projected
            .into_iter()
            .filter(|r| request.filters.matches_type(r.memory_type.as_str()))
            .take(request.limit)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_lowercases_and_drops_short_tokens() {
        let tokens = tokenize("Alice's Migration-Project, v2!");
        assert_eq!(tokens, vec!["alice", "migration", "project", "v2"]);
    }

    #[test]
    fn tokenize_empty_query_is_empty() {
        assert!(tokenize("  !! ").is_empty());
    }
}
