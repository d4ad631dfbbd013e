//! Tool-calling types

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A callable action advertised to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Name the model uses to invoke the tool
    pub name: String,

    /// What the tool does, shown to the model
    pub description: String,

    /// JSON schema of the tool arguments
    pub parameters: Value,
}

impl ToolDefinition {
    /// Create a tool definition
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// A tool invocation proposed by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Correlation id, echoed back on the observation
    pub id: String,

    /// Kind of call, currently always `function`
    #[serde(default = "default_call_type", rename = "type")]
    pub call_type: String,

    /// Function name and arguments
    pub function: FunctionCall,
}

fn default_call_type() -> String {
    "function".to_string()
}

impl ToolCall {
    /// Create a function tool call
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            call_type: default_call_type(),
            function: FunctionCall {
                name: name.into(),
                arguments,
            },
        }
    }

    /// Name of the invoked tool
    pub fn name(&self) -> &str {
        &self.function.name
    }
}

/// Function name plus decoded arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Name of the function to call
    pub name: String,

    /// Arguments as JSON. Providers send a JSON string; when that string does
    /// not parse it is kept verbatim as a `Value::String`.
    #[serde(default)]
    pub arguments: Value,
}
