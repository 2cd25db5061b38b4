//! The `Embedder` contract.
//!
//! Maps text to a unit-normalized, fixed-dimension vector. Backends (local cross-encoder, cloud
//! Titan-style, OpenAI-compatible HTTP) are pluggable behind this trait; retry/backoff for
//! transient failures lives in `cairn-utils` and wraps whichever backend is configured, so
//! individual implementations stay free of retry loops.

use crate::error::Result;
use async_trait::async_trait;

/// Text embedding provider.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Fixed dimensionality of every vector this embedder returns.
    fn dimensions(&self) -> usize;

    /// A stable name for logging/metrics (`"candle-bge-small"`, `"openai"`,...).
    fn name(&self) -> &str;

    /// Embed a single piece of text. Returned vector is L2-normalized and has length `self.dimensions`.
    ///
    /// # Errors Transient errors (rate limit, timeout, 5xx) should already have been retried by the
    /// implementation ; non-transient errors surface directly.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a batch of texts. Default implementation calls [`Self::embed`]
    /// sequentially; HTTP-backed implementations should override this to
    /// issue one batched request.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }
}
