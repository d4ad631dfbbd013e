//! Error types shared by the memory and graph crates

use memoir_llm::LlmError;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result alias for memory and agent operations
pub type MemoirResult<T> = Result<T, MemoirError>;

/// Errors raised by stores, tools and the agent loop
#[derive(Debug, Error)]
pub enum MemoirError {
    /// A storage backend operation failed
    #[error("storage operation '{operation}' failed: {source}")]
    Storage {
        /// Operation that failed (e.g. `append_turns`)
        operation: String,
        /// Underlying error
        #[source]
        source: BoxError,
    },

    /// Input did not satisfy a constraint
    #[error("validation failed for '{field}': {constraint} (got {value})")]
    Validation {
        /// Offending field
        field: String,
        /// Constraint that was violated
        constraint: String,
        /// Value that was supplied
        value: String,
    },

    /// The language model could not be reached or answered with an error
    #[error(transparent)]
    Llm(#[from] LlmError),

    /// A tool invocation could not be executed
    #[error("tool '{tool}' failed: {message}")]
    Tool {
        /// Tool name
        tool: String,
        /// What went wrong
        message: String,
    },

    /// Programming error: an invariant of the turn state was violated
    #[error("invalid state: {0}")]
    InvalidState(String),
}

impl MemoirError {
    /// Create a storage error
    pub fn storage(operation: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Storage {
            operation: operation.into(),
            source: source.into(),
        }
    }

    /// Create a validation error
    pub fn validation(
        field: impl Into<String>,
        constraint: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::Validation {
            field: field.into(),
            constraint: constraint.into(),
            value: value.into(),
        }
    }

    /// Create a tool error
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Create an invalid-state error
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }
}
