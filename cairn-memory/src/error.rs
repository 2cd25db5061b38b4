//! Error types for the memory store.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, MemoryError>;

/// Errors from [`crate::store::MemoryStore`] operations.
///
/// `store`/`modify` surface failures to the caller (database failure or permanent embedder failure
/// after retries are the only cases that should raise); read paths degrade to empty results
/// upstream in `cairn-search` rather than failing the whole request.
#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("storage backend error: {0}")]
    Storage(#[from] cairn_storage::StorageError),

    #[error("embedding error: {0}")]
    Embedding(#[from] cairn_core::CairnError),

    #[error("memory not found: {0}")]
    NotFound(i64),

    #[error("invalid project name: {0}")]
    InvalidProject(String),

    #[error("invalid memory type: {0}")]
    InvalidMemoryType(String),

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
