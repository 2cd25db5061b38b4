//! Embedder/LLM/reranker backend selection and connection settings. Encoded as closed enums over
//! built-in backends rather than a stringly-typed runtime registry.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Built-in embedder backends. `cairn-providers` constructs a concrete
/// `Box<dyn Embedder>` from one of these at startup.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EmbedderBackendConfig {
    /// Local candle-based sentence embedding model, downloaded from the Hub
    /// on first use.
    Candle { model_id: String, dimensions: usize },
    /// Local Ollama embedding endpoint.
    Ollama { base_url: String, model: String, dimensions: usize },
    /// Any OpenAI-compatible `/embeddings` HTTP endpoint (also covers
    /// Bedrock Titan-style gateways fronted with that shape).
    OpenAiCompatible { base_url: String, model: String, dimensions: usize, api_key_env: Option<String> },
}

impl Default for EmbedderBackendConfig {
    fn default() -> Self {
        Self::Candle { model_id: "BAAI/bge-small-en-v1.5".to_string(), dimensions: 384 }
    }
}

/// Built-in LLM backends.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LlmBackendConfig {
    /// Local candle-based quantized (GGUF) model.
    Candle { model_id: String, device: String },
    /// Local Ollama chat endpoint.
    Ollama { base_url: String, model: String },
    /// Hosted provider via `rig-core` (OpenAI, Anthropic,...).
    Rig { provider: String, model: String, api_key_env: String },
}

impl Default for LlmBackendConfig {
    fn default() -> Self {
        Self::Ollama { base_url: "http://localhost:11434".to_string(), model: "llama3.1:8b".to_string() }
    }
}

/// Built-in reranker backends.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RerankerBackendConfig {
    /// No reranker configured; `SearchV2` keeps RRF/handler-blended order.
    None,
    /// Lazy-loaded local cross-encoder.
    Candle { model_id: String },
    /// Cloud reranker HTTP endpoint. Documents are capped at 500 and truncated to 4000 chars before
    /// upload.
    Cloud { base_url: String, model: String, api_key_env: String },
}

impl Default for RerankerBackendConfig {
    fn default() -> Self {
        Self::None
    }
}

/// Per-backend call timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutsConfig {
    pub embedder_secs: u64,
    pub llm_secs: u64,
    pub graph_secs: u64,
    pub reranker_secs: u64,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self { embedder_secs: 60, llm_secs: 30, graph_secs: 10, reranker_secs: 30 }
    }
}

impl TimeoutsConfig {
    #[must_use]
    pub const fn embedder(&self) -> Duration {
        Duration::from_secs(self.embedder_secs)
    }

    #[must_use]
    pub const fn llm(&self) -> Duration {
        Duration::from_secs(self.llm_secs)
    }

    #[must_use]
    pub const fn graph(&self) -> Duration {
        Duration::from_secs(self.graph_secs)
    }

    #[must_use]
    pub const fn reranker(&self) -> Duration {
        Duration::from_secs(self.reranker_secs)
    }
}

/// Combined provider configuration.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub embedder: EmbedderBackendConfig,
    pub llm: LlmBackendConfig,
    pub reranker: RerankerBackendConfig,
    pub timeouts: TimeoutsConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_timeouts_match_spec_section_5() {
        let t = TimeoutsConfig::default();
        assert_eq!(t.embedder_secs, 60);
        assert_eq!(t.graph_secs, 10);
        assert_eq!(t.reranker_secs, 30);
    }

    #[test]
    fn reranker_defaults_to_none() {
        assert_eq!(RerankerBackendConfig::default(), RerankerBackendConfig::None);
    }
}
