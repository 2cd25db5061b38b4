//! Local Ollama backend: `Embedder`/`Llm` over Ollama's HTTP API.
//!
//! Model management (list/pull/info) goes through [`super::OllamaModelManager`]
//! (`ollama-rs`); inference talks straight to the `/api/embeddings` and
//! `/api/chat` endpoints over `reqwest`, since those are simple enough that
//! pulling in a second client library for them would be redundant.

use async_trait::async_trait;
use cairn_core::traits::llm::{Message, Role, StopReason, ToolCompletion};
use cairn_core::types::l2_normalize;
use cairn_core::{CairnError, Embedder, Llm, Result};
use cairn_utils::retry::{retry_with_backoff, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Embedder backed by a local Ollama server's `/api/embeddings` endpoint.
pub struct OllamaEmbedder {
    client: reqwest::Client,
    base_url: String,
    model: String,
    dimensions: usize,
}

impl OllamaEmbedder {
    #[must_use]
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, dimensions: usize) -> Self {
        Self {
            client: reqwest::Client::builder().timeout(Duration::from_secs(60)).build().unwrap_or_default(),
            base_url: base_url.into(),
            model: model.into(),
            dimensions,
        }
    }
}

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    embedding: Vec<f32>,
}

fn is_transient_status(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "ollama"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let policy = RetryPolicy::embedder_default();
        let body = EmbeddingsRequest { model: &self.model, prompt: text };

        let mut vector = retry_with_backoff(
            policy,
            |err: &CairnError| err.is_degradable(),
            || async {
                let response = self
                    .client
                    .post(format!("{}/api/embeddings", self.base_url))
                    .json(&body)
                    .send()
                    .await
                    .map_err(|e| CairnError::transient("ollama", e.to_string()))?;

                let status = response.status();
                if is_transient_status(status) {
                    return Err(CairnError::transient("ollama", format!("HTTP {status}")));
                }
                if !status.is_success() {
                    return Err(CairnError::permanent("ollama", format!("HTTP {status}")));
                }
                let parsed: EmbeddingsResponse = response
                    .json()
                    .await
                    .map_err(|e| CairnError::invariant(format!("malformed ollama embeddings response: {e}")))?;
                Ok(parsed.embedding)
            },
        )
        .await?;

        l2_normalize(&mut vector);
        Ok(vector)
    }
}

/// LLM backed by a local Ollama server's `/api/chat` endpoint.
pub struct OllamaLlm {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaLlm {
    #[must_use]
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder().timeout(Duration::from_secs(120)).build().unwrap_or_default(),
            base_url: base_url.into(),
            model: model.into(),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    options: ChatOptions,
}

#[derive(Serialize)]
struct ChatOptions {
    num_predict: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
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
impl Llm for OllamaLlm {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn generate(&self, messages: &[Message], max_tokens: u32) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: messages.iter().map(|m| ChatMessage { role: role_str(m.role), content: &m.content }).collect(),
            stream: false,
            options: ChatOptions { num_predict: max_tokens },
        };

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| CairnError::transient("ollama", e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CairnError::permanent("ollama", format!("HTTP {status}")));
        }
        let parsed: ChatResponse =
            response.json().await.map_err(|e| CairnError::invariant(format!("malformed ollama chat response: {e}")))?;
        Ok(parsed.message.content)
    }

    async fn generate_with_tools(
        &self,
        messages: &[Message],
        _tools: &[cairn_core::traits::llm::ToolSpec],
        max_tokens: u32,
    ) -> Result<ToolCompletion> {
        // Ollama's tool-call support varies by model; fall back to plain
        // generation, matching the default `Llm::generate_with_tools` behavior.
        let text = self.generate(messages, max_tokens).await?;
        Ok(ToolCompletion { text, stop_reason: StopReason::EndTurn, tool_calls: Vec::new() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_str_maps_every_variant() {
        assert_eq!(role_str(Role::System), "system");
        assert_eq!(role_str(Role::User), "user");
        assert_eq!(role_str(Role::Assistant), "assistant");
    }
}
