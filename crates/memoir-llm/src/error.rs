//! Error types for the LLM client

use thiserror::Error;

/// Result alias for LLM operations
pub type LlmResult<T> = Result<T, LlmError>;

/// Errors raised while talking to a language-model endpoint
#[derive(Debug, Error)]
pub enum LlmError {
    /// Transport-level failure (connect, timeout, TLS, body read)
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status
    #[error("api error ({status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body or error message returned by the provider
        message: String,
    },

    /// Request or response (de)serialization failed
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The response was well-formed JSON but missing required parts
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Client misconfiguration
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl LlmError {
    /// Create an invalid-response error
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse(message.into())
    }
}
