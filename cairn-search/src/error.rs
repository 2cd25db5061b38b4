//! Error taxonomy for the search pipeline.
//!
//! Nothing here should ever reach a caller of [`crate::search_v2::SearchV2`]: `search` never raises
//! — every variant here is caught internally and converted into a fallback-tier transition or a
//! `cairn_core::CairnError` at the one place the contract allows raising (`store`, not `search`).

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SearchError>;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("memory store error: {0}")]
    Memory(#[from] cairn_memory::MemoryError),

    #[error("storage error: {0}")]
    Storage(#[from] cairn_storage::StorageError),

    #[error("embedder error: {0}")]
    Embedder(cairn_core::CairnError),

    #[error("llm error: {0}")]
    Llm(cairn_core::CairnError),

    #[error("reranker error: {0}")]
    Reranker(String),

    #[error("router returned malformed output: {0}")]
    RouterMalformed(String),

    #[error("extraction returned malformed output: {0}")]
    ExtractionMalformed(String),

    #[error("invalid request: {0}")]
    Client(String),
}

impl SearchError {
    /// Whether the search pipeline should fall back to the next tier on this error.
    #[must_use]
    pub const fn is_degradable(&self) -> bool {
        !matches!(self, Self::Client(_))
    }
}
