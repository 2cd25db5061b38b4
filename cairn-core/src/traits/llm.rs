//! The `Llm` contract.
//!
//! Chat-style generation with an optional tool-call interface. Any failure surfaces to the caller;
//! the retrieval pipeline treats an `Llm` failure as a signal to degrade (no router call ->
//! exploratory defaults, extraction falls back to minimal enrichment) rather than retrying
//! indefinitely.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A tool the model may call (JSON-schema-constrained structured output).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters_schema: Value,
}

/// A tool invocation the model chose to make.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    pub arguments: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EndTurn,
    MaxTokens,
    ToolUse,
}

/// Result of a tool-enabled generation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCompletion {
    pub text: String,
    pub stop_reason: StopReason,
    pub tool_calls: Vec<ToolCall>,
}

/// Chat-style LLM provider.
#[async_trait]
pub trait Llm: Send + Sync {
    /// A stable name for logging/metrics.
    fn name(&self) -> &str;

    /// Plain-text generation.
    async fn generate(&self, messages: &[Message], max_tokens: u32) -> Result<String>;

    /// Generation with an optional tool-call interface. The default
    /// implementation falls back to [`Self::generate`] and reports
    /// `StopReason::EndTurn` with no tool calls, for backends that cannot
    /// constrain output; `KnowledgeExtractor` and `QueryRouter` prefer
    /// backends that implement this directly so they get validated JSON
    /// back instead of having to parse free text.
    async fn generate_with_tools(
        &self,
        messages: &[Message],
        _tools: &[ToolSpec],
        max_tokens: u32,
    ) -> Result<ToolCompletion> {
        let text = self.generate(messages, max_tokens).await?;
        Ok(ToolCompletion { text, stop_reason: StopReason::EndTurn, tool_calls: Vec::new() })
    }
}
