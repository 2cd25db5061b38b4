//! Hybrid retrieval for Cairn: the RRF baseline, the typed query handlers, the LLM-driven router
//! and knowledge extractor, the cross-encoder reranker, and the `SearchV2` orchestrator that
//! composes all of it behind the single `search` entry point.
//!
//! `SearchV2` is the only thing callers outside this crate should hold -- everything else here is a
//! component it wires together. Enhanced mode degrades to [`engine::SearchEngine`] on any internal
//! failure, which in turn degrades to an empty signal rather than raising.

pub mod engine;
pub mod enrichment;
pub mod error;
pub mod extractor;
pub mod handlers;
pub mod reranker;
pub mod router;
pub mod rrf;
pub mod search_v2;
pub mod types;

pub use engine::SearchEngine;
pub use enrichment::EnrichmentListener;
pub use error::{Result, SearchError};
pub use extractor::KnowledgeExtractor;
pub use reranker::{rerank, RerankCandidate, Reranker};
pub use router::QueryRouter;
pub use search_v2::{SearchV2, SearchV2Config};
pub use types::{
    Candidate, QueryType, ResolveCounts, Route, SearchFilters, SearchMode, SearchRequest, SearchResult, TemporalBounds,
};

pub mod prelude {
    pub use crate::{KnowledgeExtractor, QueryRouter, SearchEngine, SearchFilters, SearchMode, SearchRequest, SearchResult, SearchV2, SearchV2Config};
}
