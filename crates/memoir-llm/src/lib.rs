//! # Memoir LLM
//!
//! Minimal OpenAI-compatible client used by Memoir agents.
//!
//! - [`ChatMessage`] / [`MessageRole`]: conversation messages, including tool observations
//! - [`ToolDefinition`] / [`ToolCall`]: function-calling schemas and model-proposed calls
//! - [`ChatModel`]: the seam the agent loop depends on
//! - [`Client`]: `chat/completions` + `embeddings` over HTTP
//!
//! ```rust,no_run
//! use memoir_llm::{ChatMessage, ChatModel, Client, ClientConfig};
//!
//! # async fn example() -> Result<(), memoir_llm::LlmError> {
//! let client = Client::new(ClientConfig::new("sk-..."))?;
//! let response = client
//!     .chat_completion_with_tools(vec![ChatMessage::user("Hello!")], Vec::new())
//!     .await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod client;
mod error;
mod message;
mod provider;
mod tool;

pub use client::{Client, ClientConfig, DEFAULT_EMBEDDING_DIMENSIONS};
pub use error::{LlmError, LlmResult};
pub use message::{ChatMessage, MessageRole};
pub use provider::{ChatModel, ChatResponse};
pub use tool::{FunctionCall, ToolCall, ToolDefinition};
