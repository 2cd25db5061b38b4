//! `Embedder`/`Llm` over any OpenAI-compatible HTTP API (self-hosted
//! inference servers, OpenAI itself, or a cloud reranker exposed the same
//! way). Kept separate from [`crate::rig`] since `rig-core` doesn't expose a
//! raw embeddings endpoint and a reranker is just another chat completion.

use async_trait::async_trait;
use cairn_core::traits::llm::{Message, Role, StopReason, ToolCompletion};
use cairn_core::types::l2_normalize;
use cairn_core::{CairnError, Embedder, Llm, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub struct OpenAiCompatibleEmbedder {
    client: reqwest::Client,
    base_url: String,
    model: String,
    dimensions: usize,
    api_key: String,
}

impl OpenAiCompatibleEmbedder {
    #[must_use]
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, dimensions: usize, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder().timeout(Duration::from_secs(60)).build().unwrap_or_default(),
            base_url: base_url.into(),
            model: model.into(),
            dimensions,
            api_key: api_key.into(),
        }
    }
}

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingsDatum>,
}

#[derive(Deserialize)]
struct EmbeddingsDatum {
    embedding: Vec<f32>,
}

#[async_trait]
impl Embedder for OpenAiCompatibleEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "openai_compatible"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let body = EmbeddingsRequest { model: &self.model, input: text };
        let response = self
            .client
            .post(format!("{}/v1/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| CairnError::transient("openai_compatible", e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            return Err(CairnError::transient("openai_compatible", format!("HTTP {status}")));
        }
        if !status.is_success() {
            return Err(CairnError::permanent("openai_compatible", format!("HTTP {status}")));
        }

        let mut parsed: EmbeddingsResponse =
            response.json().await.map_err(|e| CairnError::invariant(format!("malformed embeddings response: {e}")))?;
        let mut vector = parsed
            .data
            .pop()
            .ok_or_else(|| CairnError::invariant("embeddings response contained no data"))?
            .embedding;
        l2_normalize(&mut vector);
        Ok(vector)
    }
}

pub struct OpenAiCompatibleLlm {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl OpenAiCompatibleLlm {
    #[must_use]
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder().timeout(Duration::from_secs(60)).build().unwrap_or_default(),
            base_url: base_url.into(),
            model: model.into(),
            api_key: api_key.into(),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

fn role_str(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
    }
}

#[async_trait]
impl Llm for OpenAiCompatibleLlm {
    fn name(&self) -> &str {
        "openai_compatible"
    }

    async fn generate(&self, messages: &[Message], max_tokens: u32) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: messages.iter().map(|m| ChatMessage { role: role_str(m.role), content: &m.content }).collect(),
            max_tokens,
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| CairnError::transient("openai_compatible", e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CairnError::permanent("openai_compatible", format!("HTTP {status}")));
        }

        let mut parsed: ChatResponse = response.json().await.map_err(|e| CairnError::invariant(format!("malformed chat response: {e}")))?;
        let choice = parsed.choices.pop().ok_or_else(|| CairnError::invariant("chat response contained no choices"))?;
        Ok(choice.message.content)
    }

    async fn generate_with_tools(
        &self,
        messages: &[Message],
        _tools: &[cairn_core::traits::llm::ToolSpec],
        max_tokens: u32,
    ) -> Result<ToolCompletion> {
        let text = self.generate(messages, max_tokens).await?;
        Ok(ToolCompletion { text, stop_reason: StopReason::EndTurn, tool_calls: Vec::new() })
    }
}

/// Cloud cross-encoder reranker over a Cohere-style `/v1/rerank` endpoint. Separate from
/// [`OpenAiCompatibleLlm`] -- a rerank call is a single batched request with its own response
/// shape, not a chat completion.
pub struct CloudReranker {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl CloudReranker {
    #[must_use]
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder().timeout(Duration::from_secs(60)).build().unwrap_or_default(),
            base_url: base_url.into(),
            model: model.into(),
            api_key: api_key.into(),
        }
    }
}

#[derive(Serialize)]
struct RerankRequest<'a> {
    model: &'a str,
    query: &'a str,
    documents: &'a [&'a str],
}

#[derive(Deserialize)]
struct RerankResponse {
    results: Vec<RerankResult>,
}

#[derive(Deserialize)]
struct RerankResult {
    index: usize,
    relevance_score: f32,
}

#[async_trait]
impl cairn_core::Reranker for CloudReranker {
    fn name(&self) -> &str {
        "cloud_reranker"
    }

    async fn score(&self, query: &str, documents: &[&str]) -> Result<Vec<f32>> {
        let body = RerankRequest { model: &self.model, query, documents };
        let response = self
            .client
            .post(format!("{}/v1/rerank", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| CairnError::transient("cloud_reranker", e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            return Err(CairnError::transient("cloud_reranker", format!("HTTP {status}")));
        }
        if !status.is_success() {
            return Err(CairnError::permanent("cloud_reranker", format!("HTTP {status}")));
        }

        let parsed: RerankResponse = response.json().await.map_err(|e| CairnError::invariant(format!("malformed rerank response: {e}")))?;
        let mut scores = vec![0.0_f32; documents.len()];
        for result in parsed.results {
            if let Some(slot) = scores.get_mut(result.index) {
                *slot = result.relevance_score;
            }
        }
        Ok(scores)
    }
}
