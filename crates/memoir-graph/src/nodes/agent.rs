//! Memory agent node

use crate::core::{ExecutionContext, ExecutionResult, Node, NodeId};
use crate::prompt::{system_prompt, DEFAULT_PREAMBLE};
use crate::state::TurnState;
use async_trait::async_trait;
use chrono::Utc;
use memoir_llm::{ChatMessage, ChatModel, ToolDefinition};
use memoir_memory::MemoirResult;
use std::sync::Arc;
use tracing::{debug, error};

/// Calls the model with the memory context and the memory tools bound
///
/// Appends the model's reply to the turn's messages and overwrites
/// `state.answer` with its text on every invocation, so only the last reply
/// reaches the user. A failed model call is fatal for the turn.
pub struct MemoryAgentNode {
    id: NodeId,
    model: Arc<dyn ChatModel>,
    tools: Vec<ToolDefinition>,
    preamble: String,
}

impl MemoryAgentNode {
    /// Create the node with the default preamble
    pub fn new(model: Arc<dyn ChatModel>, tools: Vec<ToolDefinition>) -> Self {
        Self {
            id: NodeId::memory_agent(),
            model,
            tools,
            preamble: DEFAULT_PREAMBLE.to_string(),
        }
    }

    /// Replace the instruction preamble
    pub fn with_preamble(mut self, preamble: impl Into<String>) -> Self {
        self.preamble = preamble.into();
        self
    }

    fn build_messages(&self, state: &TurnState) -> Vec<ChatMessage> {
        let prompt = system_prompt(
            &self.preamble,
            &state.core_memories,
            &state.recall_memories,
            Utc::now(),
        );

        let mut messages = Vec::with_capacity(state.messages.len() + 1);
        messages.push(ChatMessage::system(prompt));
        messages.extend(state.messages.iter().cloned());
        messages
    }
}

#[async_trait]
impl Node for MemoryAgentNode {
    async fn execute(
        &self,
        state: &mut TurnState,
        context: &ExecutionContext,
    ) -> MemoirResult<ExecutionResult> {
        debug!(
            turn_id = %context.turn_id,
            user_id = %state.user_id,
            message_count = state.messages.len(),
            "Entering memory agent"
        );

        let messages = self.build_messages(state);
        let response = match self
            .model
            .chat_completion_with_tools(messages, self.tools.clone())
            .await
        {
            Ok(response) => response,
            Err(err) => {
                error!(
                    turn_id = %context.turn_id,
                    user_id = %state.user_id,
                    error = %err,
                    "Model call failed"
                );
                return Err(err.into());
            }
        };

        let message = response.into_message();
        debug!(
            turn_id = %context.turn_id,
            tool_calls = message.pending_tool_calls().len(),
            "Received model response"
        );

        state.answer = message.content.clone();
        state.messages.push(message);

        Ok(ExecutionResult::Continue)
    }

    fn id(&self) -> &NodeId {
        &self.id
    }

    fn name(&self) -> &str {
        "Memory Agent"
    }
}
