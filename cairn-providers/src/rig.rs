//! Hosted LLM backend wrapping `rig-core`'s completion clients.

use async_trait::async_trait;
use cairn_core::traits::llm::{Message, Role, StopReason, ToolCompletion};
use cairn_core::{CairnError, Llm, Result};
use rig::completion::CompletionModel;
use rig::providers;

/// Completion model for one of the hosted providers `rig-core` supports.
enum RigModel {
    OpenAi(providers::openai::CompletionModel),
    Anthropic(providers::anthropic::completion::CompletionModel),
    Cohere(providers::cohere::CompletionModel),
}

/// LLM backed by a hosted provider through `rig-core`.
pub struct RigLlm {
    provider_name: String,
    model_name: String,
    model: RigModel,
}

impl RigLlm {
    /// Build a client for `provider` (`"openai"`, `"anthropic"`, or `"cohere"`).
    ///
    /// # Errors
    /// Returns [`CairnError::Client`] for an unrecognized provider name.
    pub fn new(provider: &str, model_name: impl Into<String>, api_key: &str, base_url: Option<&str>) -> Result<Self> {
        let model_name = model_name.into();
        let model = match provider {
            "openai" => {
                let client = providers::openai::Client::new(api_key);
                RigModel::OpenAi(client.completion_model(&model_name))
            }
            "anthropic" => {
                let base_url = base_url.unwrap_or("https://api.anthropic.com");
                let client = providers::anthropic::Client::new(api_key, base_url, None, "2023-06-01");
                RigModel::Anthropic(client.completion_model(&model_name))
            }
            "cohere" => {
                let client = providers::cohere::Client::new(api_key);
                RigModel::Cohere(client.completion_model(&model_name))
            }
            other => return Err(CairnError::client(format!("unsupported hosted provider: {other}"))),
        };

        Ok(Self { provider_name: provider.to_string(), model_name, model })
    }

    /// `rig-core`'s simple completion API takes a single prompt string, not
    /// a chat transcript, so messages are flattened with role tags.
    fn render_prompt(messages: &[Message]) -> String {
        messages
            .iter()
            .map(|m| {
                let tag = match m.role {
                    Role::System => "System",
                    Role::User => "User",
                    Role::Assistant => "Assistant",
                };
                format!("{tag}: {}", m.content)
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let choice = match &self.model {
            RigModel::OpenAi(model) => model
                .completion_request(prompt)
                .send()
                .await
                .map_err(|e| CairnError::transient(&self.provider_name, e.to_string()))?
                .choice,
            RigModel::Anthropic(model) => model
                .completion_request(prompt)
                .send()
                .await
                .map_err(|e| CairnError::transient(&self.provider_name, e.to_string()))?
                .choice,
            RigModel::Cohere(model) => model
                .completion_request(prompt)
                .send()
                .await
                .map_err(|e| CairnError::transient(&self.provider_name, e.to_string()))?
                .choice,
        };

        match choice {
            rig::completion::ModelChoice::Message(text) => Ok(text),
            rig::completion::ModelChoice::ToolCall(name, _params) => {
                Err(CairnError::invariant(format!("unexpected tool call from {}: {name}", self.provider_name)))
            }
        }
    }
}

#[async_trait]
impl Llm for RigLlm {
    fn name(&self) -> &str {
        &self.provider_name
    }

    async fn generate(&self, messages: &[Message], _max_tokens: u32) -> Result<String> {
        let prompt = Self::render_prompt(messages);
        self.complete(&prompt).await
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

impl std::fmt::Debug for RigLlm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RigLlm").field("provider", &self.provider_name).field("model", &self.model_name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_prompt_tags_every_role() {
        let messages = vec![Message::system("be terse"), Message::user("hi")];
        let prompt = RigLlm::render_prompt(&messages);
        assert_eq!(prompt, "System: be terse\n\nUser: hi");
    }

    #[test]
    fn new_rejects_unknown_provider() {
        let result = RigLlm::new("unknown", "model", "key", None);
        assert!(result.is_err());
    }
}
