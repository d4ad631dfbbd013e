//! OpenAI-compatible HTTP client

use crate::error::{LlmError, LlmResult};
use crate::message::{ChatMessage, MessageRole};
use crate::provider::{ChatModel, ChatResponse};
use crate::tool::{FunctionCall, ToolCall, ToolDefinition};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Default OpenAI endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Embedding size requested unless configured otherwise
pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 1024;

/// Connection and model settings for [`Client`]
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Bearer token sent with every request
    pub api_key: String,

    /// Base URL, e.g. `https://api.openai.com/v1`
    pub base_url: String,

    /// Chat model name
    pub model: String,

    /// Embedding model name
    pub embedding_model: String,

    /// Requested embedding size, when the provider supports truncation
    pub embedding_dimensions: Option<usize>,

    /// Per-request timeout
    pub request_timeout: Duration,
}

impl ClientConfig {
    /// Create a configuration with default endpoint and models
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: "gpt-4o-2024-11-20".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            embedding_dimensions: Some(DEFAULT_EMBEDDING_DIMENSIONS),
            request_timeout: Duration::from_secs(60),
        }
    }

    /// Set the base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the chat model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the embedding model and its dimensions
    pub fn with_embedding_model(
        mut self,
        model: impl Into<String>,
        dimensions: Option<usize>,
    ) -> Self {
        self.embedding_model = model.into();
        self.embedding_dimensions = dimensions;
        self
    }

    /// Set the request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// HTTP client for `chat/completions` and `embeddings`
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    config: ClientConfig,
}

impl Client {
    /// Build a client
    pub fn new(config: ClientConfig) -> LlmResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(LlmError::Configuration("api key is empty".to_string()));
        }

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self { http, config })
    }

    /// Client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> LlmResult<R>
    where
        B: Serialize + ?Sized,
        R: for<'de> Deserialize<'de>,
    {
        let response = self
            .http
            .post(self.endpoint(path))
            .bearer_auth(&self.config.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Embed a single text with the configured embedding model
    pub async fn embed(&self, input: &str) -> LlmResult<Vec<f32>> {
        let request = EmbeddingRequest {
            model: &self.config.embedding_model,
            input,
            dimensions: self.config.embedding_dimensions,
        };

        let response: EmbeddingResponse = self.post("embeddings", &request).await?;
        response
            .data
            .into_iter()
            .next()
            .map(|item| item.embedding)
            .ok_or_else(|| LlmError::invalid_response("embedding response contained no data"))
    }
}

#[async_trait]
impl ChatModel for Client {
    async fn chat_completion_with_tools(
        &self,
        messages: Vec<ChatMessage>,
        tools: Vec<ToolDefinition>,
    ) -> LlmResult<ChatResponse> {
        debug!(
            model = %self.config.model,
            message_count = messages.len(),
            tool_count = tools.len(),
            "Sending chat completion"
        );

        let request = CompletionRequest {
            model: &self.config.model,
            messages: messages.iter().map(WireMessage::from).collect(),
            tools: tools.into_iter().map(WireTool::from).collect(),
        };

        let response: CompletionResponse = self.post("chat/completions", &request).await?;
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::invalid_response("completion contained no choices"))?;

        let tool_calls = choice
            .message
            .tool_calls
            .map(|calls| calls.into_iter().map(ToolCall::from).collect::<Vec<_>>())
            .filter(|calls| !calls.is_empty());

        Ok(ChatResponse {
            content: choice.message.content.unwrap_or_default(),
            tool_calls,
            model: response.model.unwrap_or_else(|| self.config.model.clone()),
            finish_reason: choice.finish_reason,
        })
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool>,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: WireMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct WireMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl From<&ChatMessage> for WireMessage {
    fn from(message: &ChatMessage) -> Self {
        let tool_calls = message
            .tool_calls
            .as_ref()
            .map(|calls| calls.iter().map(WireToolCall::from).collect());

        // Assistant turns that only carry tool calls are sent with null content.
        let content = if message.role == MessageRole::Assistant
            && message.content.is_empty()
            && tool_calls.is_some()
        {
            None
        } else {
            Some(message.content.clone())
        };

        Self {
            role: message.role.as_str().to_string(),
            content,
            tool_calls,
            tool_call_id: message.tool_call_id.clone(),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type", default = "function_type")]
    call_type: String,
    function: WireFunction,
}

fn function_type() -> String {
    "function".to_string()
}

#[derive(Serialize, Deserialize)]
struct WireFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

impl From<&ToolCall> for WireToolCall {
    fn from(call: &ToolCall) -> Self {
        let arguments = match &call.function.arguments {
            Value::String(raw) => raw.clone(),
            Value::Null => "{}".to_string(),
            other => other.to_string(),
        };

        Self {
            id: call.id.clone(),
            call_type: call.call_type.clone(),
            function: WireFunction {
                name: call.function.name.clone(),
                arguments,
            },
        }
    }
}

impl From<WireToolCall> for ToolCall {
    fn from(call: WireToolCall) -> Self {
        let raw = call.function.arguments;
        let arguments = if raw.trim().is_empty() {
            Value::Object(Default::default())
        } else {
            serde_json::from_str(&raw).unwrap_or(Value::String(raw))
        };

        ToolCall {
            id: call.id,
            call_type: call.call_type,
            function: FunctionCall {
                name: call.function.name,
                arguments,
            },
        }
    }
}

#[derive(Serialize)]
struct WireTool {
    #[serde(rename = "type")]
    tool_type: &'static str,
    function: ToolDefinition,
}

impl From<ToolDefinition> for WireTool {
    fn from(definition: ToolDefinition) -> Self {
        Self {
            tool_type: "function",
            function: definition,
        }
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_tool_call_parses_arguments() {
        let wire = WireToolCall {
            id: "call_1".to_string(),
            call_type: "function".to_string(),
            function: WireFunction {
                name: "store_core_memory".to_string(),
                arguments: r#"{"memory":"My name is Alex"}"#.to_string(),
            },
        };

        let call = ToolCall::from(wire);
        assert_eq!(call.name(), "store_core_memory");
        assert_eq!(call.function.arguments, json!({"memory": "My name is Alex"}));
    }

    #[test]
    fn test_wire_tool_call_keeps_malformed_arguments() {
        let wire = WireToolCall {
            id: "call_1".to_string(),
            call_type: "function".to_string(),
            function: WireFunction {
                name: "search_memory".to_string(),
                arguments: "{not json".to_string(),
            },
        };

        let call = ToolCall::from(wire);
        assert_eq!(call.function.arguments, Value::String("{not json".to_string()));
    }

    #[test]
    fn test_tool_only_assistant_message_has_null_content() {
        let message = ChatMessage::assistant("")
            .with_tool_calls(vec![ToolCall::new("call_1", "search_memory", json!({"query": "x"}))]);
        let wire = WireMessage::from(&message);

        assert!(wire.content.is_none());
        let calls = wire.tool_calls.unwrap();
        assert_eq!(calls[0].function.arguments, r#"{"query":"x"}"#);
    }

    #[test]
    fn test_empty_api_key_is_rejected() {
        let result = Client::new(ClientConfig::new("  "));
        assert!(matches!(result, Err(LlmError::Configuration(_))));
    }
}
