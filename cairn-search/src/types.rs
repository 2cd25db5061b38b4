//! Shared types for the search pipeline: the public request/response shapes, the router's output,
//! and the internal candidate representation RRF fusion and the handlers operate on.

use cairn_graph::types::Aspect;
use cairn_memory::types::Memory;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// `mode` parameter of the core `search` operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    #[default]
    Semantic,
    Keyword,
    Tag,
}

/// `project`/`memory_type` filters.
#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
    /// `None` searches every project., project scope is always a hard filter -- this never broadens
    /// beyond what the caller named.
    pub projects: Option<Vec<String>>,
    pub memory_types: Option<Vec<String>>,
}

impl SearchFilters {
    #[must_use]
    pub fn matches_type(&self, memory_type: &str) -> bool {
        self.memory_types.as_ref().is_none_or(|types| types.iter().any(|t| t == memory_type))
    }

    /// The single project to scope a `Storage` call to, when exactly one
    /// was named; `None` for "all projects" or "several projects" (the
    /// latter is handled by the caller fanning out per project).
    #[must_use]
    pub fn single_project(&self) -> Option<&str> {
        match self.projects.as_deref() {
            Some([only]) => Some(only.as_str()),
            _ => None,
        }
    }
}

/// Parameters of the core `search` operation.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query: String,
    pub filters: SearchFilters,
    pub mode: SearchMode,
    pub limit: usize,
    pub include_full: bool,
}

impl SearchRequest {
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self { query: query.into(), filters: SearchFilters::default(), mode: SearchMode::default(), limit: 10, include_full: false }
    }
}

/// Output schema of the core `search` operation. `content` is `None` when `include_full` was false
/// and the content exceeds the inline-content threshold; `summary` is always populated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: i64,
    pub content: Option<String>,
    pub summary: String,
    pub memory_type: String,
    pub importance: f32,
    pub project: String,
    pub tags: Vec<String>,
    pub auto_tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rerank_score: Option<f32>,
}

/// Inline-content threshold from : content is returned in full only when `include_full` is set, or
/// the content is short enough that omitting it would save nothing.
pub const INLINE_CONTENT_MAX_CHARS: usize = 500;

impl SearchResult {
    #[must_use]
    pub fn project(memory: &Memory, score: f64, rerank_score: Option<f32>, include_full: bool) -> Self {
        let content = if include_full || memory.content.chars().count() <= INLINE_CONTENT_MAX_CHARS {
            Some(memory.content.clone())
        } else {
            None
        };
        Self {
            id: memory.id,
            content,
            summary: memory.summary.clone().unwrap_or_default(),
            memory_type: memory.memory_type.as_str().to_string(),
            importance: memory.importance,
            project: memory.project.clone(),
            tags: memory.tags.iter().cloned().collect(),
            auto_tags: memory.auto_tags.iter().cloned().collect(),
            created_at: memory.created_at,
            score,
            rerank_score,
        }
    }
}

/// The five query types the router classifies into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    EntityLookup,
    AspectQuery,
    Temporal,
    Relationship,
    Exploratory,
}

impl QueryType {
    /// Query types the orchestrator treats as "entity-anchored" for the proper-noun extraction
    /// heuristic -- all but `temporal` and `exploratory`.
    #[must_use]
    pub const fn is_entity_anchored(self) -> bool {
        matches!(self, Self::EntityLookup | Self::AspectQuery | Self::Relationship)
    }
}

/// Natural-language or ISO date bounds extracted by the router. Left unparsed here --
/// `handle_temporal` resolves them against "now" at dispatch time, since "7 days ago" only means
/// something relative to when the query ran.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemporalBounds {
    pub after: Option<String>,
    pub before: Option<String>,
}

/// The router's structured output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    pub query_type: QueryType,
    pub aspects: Vec<Aspect>,
    pub entity_hints: Vec<String>,
    pub temporal: TemporalBounds,
    pub confidence: f32,
}

impl Route {
    /// The advisory default on router failure: exploratory, confidence 0.5, no hints.
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            query_type: QueryType::Exploratory,
            aspects: Vec::new(),
            entity_hints: Vec::new(),
            temporal: TemporalBounds::default(),
            confidence: 0.5,
        }
    }

    /// Router confidence threshold for handler dispatch.
    pub const DISPATCH_CONFIDENCE_THRESHOLD: f32 = 0.6;

    #[must_use]
    pub fn should_dispatch(&self) -> bool {
        self.confidence >= Self::DISPATCH_CONFIDENCE_THRESHOLD
    }
}

/// A ranked candidate flowing through RRF fusion, handler blending,
/// reranking, and token-budget trimming. Carries enough per-signal detail
/// for the debug fields in [`SearchResult`]'s internal representation
/// before final projection.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub memory_id: i64,
    pub score: f64,
    pub rerank_score: Option<f32>,
    /// Per-signal 1-based rank, for debugging/telemetry.
    pub signal_ranks: HashMap<&'static str, usize>,
}

impl Candidate {
    #[must_use]
    pub fn new(memory_id: i64, score: f64) -> Self {
        Self { memory_id, score, rerank_score: None, signal_ranks: HashMap::new() }
    }
}

/// Counts returned by `KnowledgeExtractor::resolve_and_persist`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveCounts {
    pub entities_created: usize,
    pub entities_merged: usize,
    pub statements_created: usize,
    pub contradictions_found: usize,
}
