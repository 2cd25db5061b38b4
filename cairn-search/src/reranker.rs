//! `Reranker` contract and built-in backends.
//!
//! Contract: `rerank(query, candidates, limit) -> candidates` with `rerank_score` attached. If
//! `candidates.len <= limit`, return unchanged. On backend failure, return the first `limit`
//! candidates unchanged rather than failing the search.

use async_trait::async_trait;
use std::sync::Arc;

/// A candidate carrying the document text a reranker scores against.
#[derive(Debug, Clone)]
pub struct RerankCandidate {
    pub memory_id: i64,
    pub text: String,
    pub score: f64,
    pub rerank_score: Option<f32>,
}

/// Cross-encoder-style reranker backend. Implementations score the whole
/// `(query, candidates)` batch in one call so batched backends (local model,
/// cloud API) can use their native batching.
#[async_trait]
pub trait Reranker: Send + Sync {
    fn name(&self) -> &str;

    /// Score `candidates` against `query`, returning `rerank_score` per
    /// candidate id. Implementations need not sort or truncate -- the
    /// [`rerank`] wrapper applies the shared contract.
    async fn score(&self, query: &str, candidates: &[RerankCandidate]) -> Result<Vec<(i64, f32)>, String>;
}

/// Applies the shared reranker contract around any [`Reranker`]
/// implementation: no-op under `limit`, soft-fail to the first `limit` on
/// backend error, sort by `rerank_score` descending on success.
pub async fn rerank(reranker: &dyn Reranker, query: &str, mut candidates: Vec<RerankCandidate>, limit: usize) -> Vec<RerankCandidate> {
    if candidates.len() <= limit {
        return candidates;
    }

    match reranker.score(query, &candidates).await {
        Ok(scores) => {
            let by_id: std::collections::HashMap<i64, f32> = scores.into_iter().collect();
            for candidate in &mut candidates {
                candidate.rerank_score = by_id.get(&candidate.memory_id).copied();
            }
            candidates.sort_by(|a, b| {
                b.rerank_score
                    .unwrap_or(f32::MIN)
                    .partial_cmp(&a.rerank_score.unwrap_or(f32::MIN))
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            candidates.truncate(limit);
            candidates
        }
        Err(err) => {
            tracing::warn!(error = %err, reranker = reranker.name(), "rerank failed, keeping blended order");
            candidates.truncate(limit);
            candidates
        }
    }
}

/// Pairwise cross-encoder scoring model, lazy-loaded by its implementation ( "local cross-encoder
/// (lazy-loaded)"). The actual model (candle or otherwise) lives behind `cairn-providers`; this
/// crate only sequences calls to it.
#[async_trait]
pub trait CrossEncoderModel: Send + Sync {
    async fn score_pair(&self, query: &str, document: &str) -> Result<f32, String>;
}

pub struct LocalReranker {
    model: Arc<dyn CrossEncoderModel>,
}

impl LocalReranker {
    #[must_use]
    pub fn new(model: Arc<dyn CrossEncoderModel>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl Reranker for LocalReranker {
    fn name(&self) -> &str {
        "local-cross-encoder"
    }

    async fn score(&self, query: &str, candidates: &[RerankCandidate]) -> Result<Vec<(i64, f32)>, String> {
        let mut out = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let score = self.model.score_pair(query, &candidate.text).await?;
            out.push((candidate.memory_id, score));
        }
        Ok(out)
    }
}

/// Document cap and per-document truncation for the cloud reranker.
pub const CLOUD_MAX_DOCUMENTS: usize = 500;
pub const CLOUD_MAX_CHARS_PER_DOCUMENT: usize = 4000;

#[cfg(feature = "cloud-reranker")]
pub struct CloudReranker {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

#[cfg(feature = "cloud-reranker")]
impl CloudReranker {
    #[must_use]
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self { client, endpoint: endpoint.into(), api_key: api_key.into() }
    }

    fn truncate(text: &str) -> String {
        text.chars().take(CLOUD_MAX_CHARS_PER_DOCUMENT).collect()
    }
}

#[cfg(feature = "cloud-reranker")]
#[derive(serde::Serialize)]
struct CloudRerankRequest<'a> {
    query: &'a str,
    documents: Vec<&'a str>,
}

#[cfg(feature = "cloud-reranker")]
#[derive(serde::Deserialize)]
struct CloudRerankResponse {
    scores: Vec<f32>,
}

#[cfg(feature = "cloud-reranker")]
#[async_trait]
impl Reranker for CloudReranker {
    fn name(&self) -> &str {
        "cloud-reranker"
    }

    async fn score(&self, query: &str, candidates: &[RerankCandidate]) -> Result<Vec<(i64, f32)>, String> {
        let capped: Vec<&RerankCandidate> = candidates.iter().take(CLOUD_MAX_DOCUMENTS).collect();
        let truncated: Vec<String> = capped.iter().map(|c| Self::truncate(&c.text)).collect();
        let request = CloudRerankRequest { query, documents: truncated.iter().map(String::as_str).collect() };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| e.to_string())?
            .error_for_status()
            .map_err(|e| e.to_string())?
            .json::<CloudRerankResponse>()
            .await
            .map_err(|e| e.to_string())?;

        Ok(capped.iter().zip(response.scores).map(|(c, score)| (c.memory_id, score)).collect())
    }
}

/// Adapts any `cairn-providers` backend implementing
/// [`cairn_core::Reranker`] to this crate's [`Reranker`] contract, so
/// `cairn-cli` can build a reranker from config once (via
/// `cairn_providers::build_reranker`) and hand it to the search pipeline
/// without `cairn-providers` depending on this crate.
pub struct ProviderRerankerAdapter {
    inner: Arc<dyn cairn_core::Reranker>,
}

impl ProviderRerankerAdapter {
    #[must_use]
    pub fn new(inner: Arc<dyn cairn_core::Reranker>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl Reranker for ProviderRerankerAdapter {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn score(&self, query: &str, candidates: &[RerankCandidate]) -> Result<Vec<(i64, f32)>, String> {
        let texts: Vec<&str> = candidates.iter().map(|c| c.text.as_str()).collect();
        let scores = self.inner.score(query, &texts).await.map_err(|e| e.to_string())?;
        Ok(candidates.iter().zip(scores).map(|(c, score)| (c.memory_id, score)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingReranker;

    #[async_trait]
    impl Reranker for FailingReranker {
        fn name(&self) -> &str {
            "failing"
        }

        async fn score(&self, _query: &str, _candidates: &[RerankCandidate]) -> Result<Vec<(i64, f32)>, String> {
            Err("backend down".to_string())
        }
    }

    struct OkReranker;

    #[async_trait]
    impl Reranker for OkReranker {
        fn name(&self) -> &str {
            "ok"
        }

        async fn score(&self, _query: &str, candidates: &[RerankCandidate]) -> Result<Vec<(i64, f32)>, String> {
            // Reverse the input order as the "true" ranking.
            Ok(candidates.iter().rev().enumerate().map(|(i, c)| (c.memory_id, i as f32)).collect())
        }
    }

    fn candidate(id: i64) -> RerankCandidate {
        RerankCandidate { memory_id: id, text: format!("doc {id}"), score: 0.0, rerank_score: None }
    }

    #[tokio::test]
    async fn under_limit_is_unchanged() {
        let candidates = vec![candidate(1), candidate(2)];
        let result = rerank(&FailingReranker, "q", candidates.clone(), 5).await;
        assert_eq!(result.len(), 2);
        assert!(result[0].rerank_score.is_none());
    }

    #[tokio::test]
    async fn failure_keeps_blended_order_truncated() {
        let candidates = vec![candidate(1), candidate(2), candidate(3)];
        let result = rerank(&FailingReranker, "q", candidates, 2).await;
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].memory_id, 1);
        assert_eq!(result[1].memory_id, 2);
    }

    #[tokio::test]
    async fn success_sorts_by_rerank_score_descending() {
        let candidates = vec![candidate(1), candidate(2), candidate(3)];
        let result = rerank(&OkReranker, "q", candidates, 2).await;
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].memory_id, 3);
        assert!(result[0].rerank_score.is_some());
    }

    struct FakeProviderReranker;

    #[async_trait]
    impl cairn_core::Reranker for FakeProviderReranker {
        fn name(&self) -> &str {
            "fake-provider"
        }

        async fn score(&self, _query: &str, documents: &[&str]) -> cairn_core::Result<Vec<f32>> {
            Ok(documents.iter().enumerate().map(|(i, _)| i as f32).collect())
        }
    }

    #[tokio::test]
    async fn provider_adapter_maps_scores_back_to_memory_ids_in_order() {
        let adapter = ProviderRerankerAdapter::new(Arc::new(FakeProviderReranker));
        let candidates = vec![candidate(10), candidate(20), candidate(30)];
        let scores = adapter.score("q", &candidates).await.unwrap();
        assert_eq!(scores, vec![(10, 0.0), (20, 1.0), (30, 2.0)]);
        assert_eq!(adapter.name(), "fake-provider");
    }
}
