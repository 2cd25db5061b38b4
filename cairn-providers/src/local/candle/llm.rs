//! `cairn-core::Llm` backed by a quantized GGUF LLaMA model running on Candle.

use async_trait::async_trait;
use cairn_core::traits::llm::{Message, Role, StopReason, ToolCompletion};
use cairn_core::{CairnError, Llm, Result};
use candle_core::{Device, Tensor};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};

use super::model_wrapper::ModelWrapper;
use super::sampling::{sample_token, SamplingConfig};

/// LLM running a quantized GGUF model locally via Candle.
///
/// Like [`super::embedder::CandleEmbedder`], forward passes mutate cached
/// attention state and are serialized behind a mutex.
pub struct CandleLlm {
    model: Mutex<ModelWrapper>,
    device: Device,
    default_model_id: String,
}

impl CandleLlm {
    /// Load a GGUF model from `model_path` (a file or a directory containing
    /// one `.gguf` file plus `tokenizer.json`).
    ///
    /// # Errors
    /// Returns [`CairnError::Permanent`] if the model fails to load.
    pub fn load(model_path: &Path, device: Device) -> Result<Self> {
        let wrapper = ModelWrapper::load(model_path, device.clone())
            .map_err(|e| CairnError::permanent("candle_llm", format!("failed to load {}: {e}", model_path.display())))?;
        let default_model_id = model_path.file_stem().and_then(|s| s.to_str()).unwrap_or("gguf").to_string();
        Ok(Self { model: Mutex::new(wrapper), device, default_model_id })
    }

    fn render_prompt(messages: &[Message]) -> String {
        let mut prompt = String::new();
        for message in messages {
            let tag = match message.role {
                Role::System => "system",
                Role::User => "user",
                Role::Assistant => "assistant",
            };
            prompt.push_str(&format!("<|{tag}|>\n{}\n", message.content));
        }
        prompt.push_str("<|assistant|>\n");
        prompt
    }

    fn generate_sync(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        let mut model = self.model.lock();
        let ModelWrapper::LLaMA { model: weights, tokenizer, .. } = &mut *model else {
            return Err(CairnError::invariant("CandleLlm only supports GGUF LLaMA-family weights"));
        };

        let prompt_tokens = tokenizer.encode(prompt, true).map_err(|e| CairnError::invariant(format!("tokenization failed: {e}")))?;
        let eos_token = tokenizer.eos_token_id().unwrap_or(2);
        let sampling = SamplingConfig::default();

        let mut tokens = prompt_tokens.clone();
        let mut generated = Vec::new();

        for index in 0..max_tokens as usize {
            let context = if index == 0 { tokens.as_slice() } else { &tokens[tokens.len() - 1..] };
            let input = Tensor::new(context, &self.device)
                .and_then(|t| t.unsqueeze(0))
                .map_err(|e| CairnError::invariant(format!("failed to build input tensor: {e}")))?;
            let index_pos = if index == 0 { 0 } else { tokens.len() - 1 };

            let logits = weights
                .forward(&input, index_pos)
                .map_err(|e| CairnError::permanent("candle_llm", format!("forward pass failed: {e}")))?;
            let logits = logits.squeeze(0).map_err(|e| CairnError::invariant(e.to_string()))?;

            let next_token = sample_token(&logits, &sampling, &tokens).map_err(|e| CairnError::invariant(format!("sampling failed: {e}")))?;
            if next_token == eos_token {
                break;
            }
            tokens.push(next_token);
            generated.push(next_token);
        }

        tokenizer.decode(&generated, true).map_err(|e| CairnError::invariant(format!("decode failed: {e}")))
    }
}

#[async_trait]
impl Llm for CandleLlm {
    fn name(&self) -> &str {
        "candle"
    }

    async fn generate(&self, messages: &[Message], max_tokens: u32) -> Result<String> {
        let prompt = Self::render_prompt(messages);
        self.generate_sync(&prompt, max_tokens)
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

/// Resolve `"auto"`/`"cpu"`/`"cuda"`/`"metal"` device selection, matching device-detection fallback
/// order: CUDA, then Metal, then CPU.
#[must_use]
pub fn resolve_device(device_str: &str) -> Device {
    match device_str {
        "cuda" => Device::cuda_if_available(0).unwrap_or(Device::Cpu),
        "metal" => Device::new_metal(0).unwrap_or(Device::Cpu),
        "cpu" => Device::Cpu,
        _ => Device::cuda_if_available(0).or_else(|_| Device::new_metal(0)).unwrap_or(Device::Cpu),
    }
}

/// Default on-disk location for downloaded Candle models: `~/.cairn/models/candle`.
#[must_use]
pub fn default_model_directory() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".cairn").join("models").join("candle")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_prompt_tags_every_role() {
        let messages = vec![Message::system("be terse"), Message::user("hi")];
        let prompt = CandleLlm::render_prompt(&messages);
        assert!(prompt.contains("<|system|>\nbe terse\n"));
        assert!(prompt.contains("<|user|>\nhi\n"));
        assert!(prompt.ends_with("<|assistant|>\n"));
    }

    #[test]
    fn resolve_device_cpu_is_explicit() {
        assert!(matches!(resolve_device("cpu"), Device::Cpu));
    }
}
