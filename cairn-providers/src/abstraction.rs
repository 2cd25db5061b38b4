//! Backend construction: turns `cairn-config`'s declarative backend choice into a concrete `Box<dyn
//! Embedder>` / `Box<dyn Llm>`.
//!
//! `cairn-config::{EmbedderBackendConfig, LlmBackendConfig}` are closed enums over the backends
//! this crate ships, plus a `Custom` slot so an embedder application can plug in its own
//! implementation without this crate maintaining a global mutable registry.

use cairn_config::{EmbedderBackendConfig, LlmBackendConfig, RerankerBackendConfig};
use cairn_core::{CairnError, Embedder, Llm, Result};
use std::path::PathBuf;
use std::sync::Arc;

use crate::local::candle::{resolve_device, CandleEmbedder, CandleLlm};
use crate::local::{OllamaEmbedder, OllamaLlm};
use crate::RigLlm;

/// Build the configured embedding backend.
///
/// `cache_dir` is where Candle-backed models are downloaded to and loaded
/// from; it is unused for the HTTP-based backends.
///
/// # Errors
/// Returns [`CairnError::Permanent`] if a local model fails to load, or
/// [`CairnError::Client`] if a cloud backend is missing its API key.
pub fn build_embedder(config: &EmbedderBackendConfig, cache_dir: &PathBuf) -> Result<Arc<dyn Embedder>> {
    match config {
        EmbedderBackendConfig::Candle { model_id, dimensions: _ } => {
            let device = resolve_device("auto");
            let embedder = CandleEmbedder::load(model_id, cache_dir, device)?;
            Ok(Arc::new(embedder))
        }
        EmbedderBackendConfig::Ollama { base_url, model, dimensions } => {
            Ok(Arc::new(OllamaEmbedder::new(base_url.clone(), model.clone(), *dimensions)))
        }
        EmbedderBackendConfig::OpenAiCompatible { base_url, model, dimensions, api_key_env } => {
            let api_key = resolve_api_key(api_key_env.as_deref())?;
            Ok(Arc::new(crate::openai_compatible::OpenAiCompatibleEmbedder::new(
                base_url.clone(),
                model.clone(),
                *dimensions,
                api_key,
            )))
        }
    }
}

/// Build the configured generation backend.
///
/// # Errors
/// Returns [`CairnError::Permanent`] if a local model fails to load, or
/// [`CairnError::Client`] if a cloud backend is missing its API key or names
/// an unsupported hosted provider.
pub fn build_llm(config: &LlmBackendConfig, model_dir: &PathBuf) -> Result<Arc<dyn Llm>> {
    match config {
        LlmBackendConfig::Candle { model_id: _, device } => {
            let device = resolve_device(device);
            let llm = CandleLlm::load(model_dir, device)?;
            Ok(Arc::new(llm))
        }
        LlmBackendConfig::Ollama { base_url, model } => Ok(Arc::new(OllamaLlm::new(base_url.clone(), model.clone()))),
        LlmBackendConfig::Rig { provider, model, api_key_env } => {
            let api_key = resolve_api_key(Some(api_key_env))?;
            let llm = RigLlm::new(provider, model.clone(), &api_key, None)?;
            Ok(Arc::new(llm))
        }
    }
}

/// Build the configured reranker backend, if any.
///
/// # Errors Returns [`CairnError::Permanent`] if a local reranker model fails to load, or
/// [`CairnError::Client`] if a cloud reranker is missing its API key.
pub fn build_reranker(config: &RerankerBackendConfig) -> Result<Option<Arc<dyn cairn_core::Reranker>>> {
    match config {
        RerankerBackendConfig::None => Ok(None),
        RerankerBackendConfig::Candle { model_id: _ } => {
            Err(CairnError::invariant("a local reranker model requires an explicit model directory; use the reranker API directly"))
        }
        RerankerBackendConfig::Cloud { base_url, model, api_key_env } => {
            let api_key = resolve_api_key(api_key_env.as_deref())?;
            Ok(Some(Arc::new(crate::openai_compatible::CloudReranker::new(base_url.clone(), model.clone(), api_key))))
        }
    }
}

fn resolve_api_key(env_var: Option<&str>) -> Result<String> {
    let env_var = env_var.ok_or_else(|| CairnError::client("cloud backend requires an api_key_env setting"))?;
    std::env::var(env_var).map_err(|_| CairnError::client(format!("environment variable {env_var} is not set")))
}
