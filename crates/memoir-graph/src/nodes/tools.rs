//! Tool dispatch node

use crate::core::{ExecutionContext, ExecutionResult, Node, NodeId};
use crate::state::TurnState;
use async_trait::async_trait;
use futures::future::join_all;
use memoir_llm::{ChatMessage, MessageRole, ToolCall};
use memoir_memory::{MemoirError, MemoirResult, MemoryTool, MemoryTools, ToolContext};
use tracing::{debug, warn};

/// Executes the tool calls of the last assistant message
///
/// Every call yields exactly one observation tied to its call id, in call
/// order. Unknown tool names and tool failures become observations; they never
/// fail the turn.
pub struct ToolDispatchNode {
    id: NodeId,
    tools: MemoryTools,
}

impl ToolDispatchNode {
    /// Create the node over the memory tools
    pub fn new(tools: MemoryTools) -> Self {
        Self {
            id: NodeId::tools(),
            tools,
        }
    }

    async fn dispatch(&self, call: ToolCall, ctx: ToolContext) -> ChatMessage {
        let name = call.name().to_string();

        let Some(tool) = MemoryTool::from_name(&name) else {
            warn!(tool = %name, tool_call_id = %call.id, "Model requested unknown tool");
            return ChatMessage::tool(call.id, unknown_tool_observation(&name));
        };

        // Run detached so a store write finishes even if the turn is dropped
        let tools = self.tools.clone();
        let arguments = call.function.arguments;
        let task = tokio::spawn(async move { tools.invoke(tool, arguments, &ctx).await });

        match task.await {
            Ok(Ok(output)) => {
                debug!(tool = %tool, tool_call_id = %call.id, "Tool completed");
                ChatMessage::tool(call.id, output.to_string())
            }
            Ok(Err(err)) => {
                warn!(
                    tool = %tool,
                    tool_call_id = %call.id,
                    error = %err,
                    "Tool invocation failed"
                );
                let text = format!("Error in tool {name}: {}", tool_error_text(&err));
                ChatMessage::tool_error(call.id, text)
            }
            Err(join_err) => {
                warn!(
                    tool = %tool,
                    tool_call_id = %call.id,
                    error = %join_err,
                    "Tool task aborted"
                );
                ChatMessage::tool_error(call.id, format!("Error in tool {name}: {join_err}"))
            }
        }
    }
}

fn unknown_tool_observation(name: &str) -> String {
    format!(
        "{name} is not a valid tool, try one of [{}].",
        MemoryTool::names().join(", ")
    )
}

fn tool_error_text(err: &MemoirError) -> String {
    match err {
        MemoirError::Tool { message, .. } => message.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl Node for ToolDispatchNode {
    async fn execute(
        &self,
        state: &mut TurnState,
        context: &ExecutionContext,
    ) -> MemoirResult<ExecutionResult> {
        let last = state
            .last_message()
            .ok_or_else(|| MemoirError::invalid_state("tool dispatch on an empty message list"))?;

        if last.role != MessageRole::Assistant {
            return Err(MemoirError::invalid_state(format!(
                "tool dispatch expects an assistant message last, found {}",
                last.role.as_str()
            )));
        }

        let calls = last.pending_tool_calls().to_vec();
        if calls.is_empty() {
            return Ok(ExecutionResult::Passthrough);
        }

        debug!(
            turn_id = %context.turn_id,
            call_count = calls.len(),
            "Dispatching tool calls"
        );

        let ctx = ToolContext {
            user_id: context.user_id,
        };
        let observations = join_all(
            calls
                .into_iter()
                .map(|call| self.dispatch(call, ctx.clone())),
        )
        .await;

        state.messages.extend(observations);
        Ok(ExecutionResult::Continue)
    }

    fn id(&self) -> &NodeId {
        &self.id
    }

    fn name(&self) -> &str {
        "Tool Dispatch"
    }
}
