//! The `Reranker` contract.
//!
//! Lives beside `Embedder`/`Llm` rather than in `cairn-search` so `cairn-providers` backends can
//! implement it without an upward dependency on the search pipeline; `cairn-search::reranker` wraps
//! any `Reranker` with the shared contract (no-op under `limit`, soft-fail to unchanged order on
//! backend error).

use crate::error::Result;
use async_trait::async_trait;

/// Cross-encoder-style batch scoring backend.
#[async_trait]
pub trait Reranker: Send + Sync {
    /// A stable name for logging/metrics (`"local-cross-encoder"`, `"cloud-reranker"`,...).
    fn name(&self) -> &str;

    /// Score `query` against each of `documents`, returning one score per
    /// document in the same order. Implementations batch the whole call
    /// rather than scoring pairs individually where their backend allows it.
    async fn score(&self, query: &str, documents: &[&str]) -> Result<Vec<f32>>;
}
