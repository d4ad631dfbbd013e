//! The language-model seam used by agents

use crate::error::LlmResult;
use crate::message::ChatMessage;
use crate::tool::{ToolCall, ToolDefinition};
use async_trait::async_trait;

/// Response of a single chat completion
#[derive(Debug, Clone, PartialEq)]
pub struct ChatResponse {
    /// Plain-text content of the assistant message
    pub content: String,

    /// Tool invocations requested by the model
    pub tool_calls: Option<Vec<ToolCall>>,

    /// Model that produced the response
    pub model: String,

    /// Provider finish reason (`stop`, `tool_calls`, ...)
    pub finish_reason: Option<String>,
}

impl ChatResponse {
    /// Plain-text response without tool calls
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_calls: None,
            model: String::new(),
            finish_reason: Some("stop".to_string()),
        }
    }

    /// Response that requests tool invocations
    pub fn with_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            content: content.into(),
            tool_calls: Some(tool_calls),
            model: String::new(),
            finish_reason: Some("tool_calls".to_string()),
        }
    }

    /// Convert into the assistant message appended to the conversation
    pub fn into_message(self) -> ChatMessage {
        ChatMessage::assistant(self.content).with_tool_calls(self.tool_calls.unwrap_or_default())
    }
}

/// A chat model that supports function calling
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Run one completion over `messages` with `tools` bound
    async fn chat_completion_with_tools(
        &self,
        messages: Vec<ChatMessage>,
        tools: Vec<ToolDefinition>,
    ) -> LlmResult<ChatResponse>;

    /// Model identifier used for requests
    fn model_name(&self) -> &str;
}
