//! `cairn-core::Embedder` backed by a local BERT checkpoint running on Candle.
//!
//! The GGUF/quantized-LLaMA machinery in this module is generation-oriented;
//! embedding models are small encoder-only transformers distributed as
//! safetensors, so this loads them the way `candle-transformers`' own BERT
//! example does: config.json + tokenizer.json + model.safetensors, mean-pooled
//! and L2-normalized into a fixed-size vector.

use async_trait::async_trait;
use cairn_core::types::l2_normalize;
use cairn_core::{CairnError, Embedder, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig, DTYPE};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use tokenizers::{PaddingParams, Tokenizer};

use super::hf_downloader::HFDownloader;

/// Embedder running a BERT-family model locally via Candle.
///
/// Inference through Candle is `&mut`-free but not `Sync` across calls to the
/// same model without synchronization (the VarBuilder-backed tensors aren't
/// `Send`-shared safely across concurrent forward passes on some backends),
/// so calls are serialized behind a mutex — acceptable since embedding
/// latency is dominated by tokenization and a single forward pass anyway.
pub struct CandleEmbedder {
    model: Mutex<BertModel>,
    tokenizer: Tokenizer,
    device: Device,
    dimensions: usize,
}

impl CandleEmbedder {
    /// Load a BERT embedding model, downloading it from the Hugging Face Hub
    /// into `cache_dir` if not already present.
    ///
    /// # Errors
    /// Returns [`CairnError::Permanent`] if the model cannot be downloaded or
    /// fails to load.
    pub fn load(model_id: &str, cache_dir: &Path, device: Device) -> Result<Self> {
        let model_dir = cache_dir.join(sanitize_repo_id(model_id));

        if !model_dir.join("model.safetensors").exists() {
            let downloader = HFDownloader::new().map_err(|e| CairnError::permanent("candle_embedder", e.to_string()))?;
            downloader
                .download_safetensors_model(model_id, &model_dir)
                .map_err(|e| CairnError::permanent("candle_embedder", format!("failed to download {model_id}: {e}")))?;
        }

        let config_text = std::fs::read_to_string(model_dir.join("config.json"))
            .map_err(|e| CairnError::permanent("candle_embedder", format!("missing config.json: {e}")))?;
        let config: BertConfig =
            serde_json::from_str(&config_text).map_err(|e| CairnError::permanent("candle_embedder", format!("invalid config.json: {e}")))?;

        let mut tokenizer = Tokenizer::from_file(model_dir.join("tokenizer.json"))
            .map_err(|e| CairnError::permanent("candle_embedder", format!("failed to load tokenizer: {e}")))?;
        tokenizer.with_padding(Some(PaddingParams::default()));

        let weights_path = model_dir.join("model.safetensors");
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], DTYPE, &device)
                .map_err(|e| CairnError::permanent("candle_embedder", format!("failed to mmap weights: {e}")))?
        };
        let model = BertModel::load(vb, &config).map_err(|e| CairnError::permanent("candle_embedder", format!("failed to build model: {e}")))?;

        Ok(Self { model: Mutex::new(model), tokenizer, device, dimensions: config.hidden_size })
    }

    fn embed_sync(&self, text: &str) -> Result<Vec<f32>> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| CairnError::invariant(format!("tokenization failed: {e}")))?;

        let ids = Tensor::new(encoding.get_ids(), &self.device)
            .and_then(|t| t.unsqueeze(0))
            .map_err(|e| CairnError::invariant(format!("failed to build input tensor: {e}")))?;
        let type_ids = Tensor::new(encoding.get_type_ids(), &self.device)
            .and_then(|t| t.unsqueeze(0))
            .map_err(|e| CairnError::invariant(format!("failed to build token-type tensor: {e}")))?;

        let model = self.model.lock();
        let output = model
            .forward(&ids, &type_ids, None)
            .map_err(|e| CairnError::permanent("candle_embedder", format!("forward pass failed: {e}")))?;
        drop(model);

        // Mean-pool over the sequence dimension, then L2-normalize.
        let (_, seq_len, _) = output.dims3().map_err(|e| CairnError::invariant(e.to_string()))?;
        let pooled = (output.sum(1).map_err(|e| CairnError::invariant(e.to_string()))? / seq_len as f64)
            .map_err(|e| CairnError::invariant(e.to_string()))?;
        let pooled = pooled.squeeze(0).map_err(|e| CairnError::invariant(e.to_string()))?;

        let mut vector: Vec<f32> = pooled.to_vec1().map_err(|e| CairnError::invariant(e.to_string()))?;
        l2_normalize(&mut vector);
        Ok(vector)
    }
}

fn sanitize_repo_id(model_id: &str) -> String {
    model_id.replace('/', "--")
}

#[async_trait]
impl Embedder for CandleEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "candle"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_sync(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_repo_id_replaces_slash() {
        assert_eq!(sanitize_repo_id("BAAI/bge-small-en-v1.5"), "BAAI--bge-small-en-v1.5");
    }
}
