//! Local backends: embedded candle inference and a local Ollama server.
//!
//! Both expose `cairn-core`'s [`Embedder`]/[`Llm`] traits directly; the model-management types
//! below (`LocalModel`, `PullProgress`,...) are a thin, backend-agnostic surface `cairn-cli` uses
//! to list/pull models — they are not part of the retrieval contract itself.

pub mod candle;
pub mod ollama_manager;
pub mod ollama_provider;

use serde::{Deserialize, Serialize};
use std::time::SystemTime;

pub use candle::{CandleEmbedder, CandleLlm};
pub use ollama_manager::OllamaModelManager;
pub use ollama_provider::{OllamaEmbedder, OllamaLlm};

/// Health status of a local provider backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum HealthStatus {
    Healthy { available_models: usize, version: Option<String> },
    Unhealthy { reason: String },
    Unknown,
}

/// Local model metadata, as reported by a backend's model-listing call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalModel {
    pub id: String,
    pub backend: String,
    pub size_bytes: u64,
    pub quantization: Option<String>,
    pub modified_at: Option<SystemTime>,
}

/// Model download progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullProgress {
    pub model_id: String,
    pub status: DownloadStatus,
    pub percent_complete: f32,
    pub bytes_downloaded: u64,
    pub bytes_total: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "state")]
pub enum DownloadStatus {
    Starting,
    Downloading,
    Verifying,
    Complete,
    Failed { error: String },
}

/// `model:variant@backend` specification used by `cairn-cli`'s model
/// management subcommands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    pub model: String,
    pub variant: Option<String>,
    pub backend: Option<String>,
}

impl ModelSpec {
    #[must_use]
    pub fn new(model: impl Into<String>) -> Self {
        Self { model: model.into(), variant: None, backend: None }
    }

    /// Parse `"llama3.1:8b@ollama"`-style specifiers: `model[:variant][@backend]`.
    #[must_use]
    pub fn parse(spec: &str) -> Self {
        let (model_part, backend) =
            spec.rfind('@').map_or((spec, None), |idx| (&spec[..idx], Some(spec[idx + 1..].to_string())));
        let (model, variant) =
            model_part.find(':').map_or((model_part, None), |idx| (&model_part[..idx], Some(model_part[idx + 1..].to_string())));
        Self { model: model.to_string(), variant, backend }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    pub backend: String,
    pub size_bytes: u64,
    pub parameter_count: Option<String>,
    pub quantization: Option<String>,
    pub format: String,
    pub loaded: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_spec_parses_variant_and_backend() {
        let spec = ModelSpec::parse("llama3.1:8b@ollama");
        assert_eq!(spec.model, "llama3.1");
        assert_eq!(spec.variant, Some("8b".to_string()));
        assert_eq!(spec.backend, Some("ollama".to_string()));
    }

    #[test]
    fn model_spec_parses_minimal() {
        let spec = ModelSpec::parse("mistral");
        assert_eq!(spec.model, "mistral");
        assert_eq!(spec.variant, None);
        assert_eq!(spec.backend, None);
    }
}
