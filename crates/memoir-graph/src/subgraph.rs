//! Memory subgraph - the per-turn decision loop
//!
//! ```text
//! memory_agent --(tool calls)--> tools --> memory_agent
//!      |
//!      +--(no tool calls)--> end
//! ```
//!
//! The loop is bounded by [`SubgraphConfig::max_iterations`] agent invocations.

use crate::config::SubgraphConfig;
use crate::core::{ExecutionContext, Node, NodeId};
use crate::nodes::{MemoryAgentNode, ToolDispatchNode};
use crate::state::TurnState;
use memoir_llm::ChatModel;
use memoir_memory::{MemoirResult, MemoryTools};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Graph id used in execution contexts
pub const MEMORY_SUBGRAPH_ID: &str = "memory_subgraph";

/// Where the loop goes next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Run the memory agent
    MemoryAgent,

    /// Run the tool dispatch node
    Tools,

    /// Terminate the loop
    End,
}

/// Routing after the memory agent: tools if the last message carries tool
/// calls, otherwise the end
pub fn route_tools(state: &TurnState) -> Step {
    match state.last_message() {
        Some(message) if message.has_tool_calls() => Step::Tools,
        _ => Step::End,
    }
}

/// How the loop terminated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubgraphOutcome {
    /// The model produced a reply without tool calls
    Completed {
        /// Agent invocations used
        iterations: usize,
    },

    /// The iteration cap was reached while the model still requested tools
    Exhausted {
        /// Agent invocations used
        iterations: usize,
    },
}

impl SubgraphOutcome {
    /// Number of agent invocations
    pub fn iterations(&self) -> usize {
        match self {
            Self::Completed { iterations } | Self::Exhausted { iterations } => *iterations,
        }
    }
}

/// The memory agent and tool dispatch nodes wired into a bounded loop
pub struct MemorySubgraph {
    agent: Arc<dyn Node>,
    tools: Arc<dyn Node>,
    config: SubgraphConfig,
}

impl MemorySubgraph {
    /// Build the standard subgraph over `model` and `tools`
    pub fn new(model: Arc<dyn ChatModel>, tools: MemoryTools, config: SubgraphConfig) -> Self {
        let agent = MemoryAgentNode::new(model, tools.definitions());
        let dispatch = ToolDispatchNode::new(tools);
        Self::from_nodes(Arc::new(agent), Arc::new(dispatch), config)
    }

    /// Wire arbitrary agent and tool nodes
    pub fn from_nodes(agent: Arc<dyn Node>, tools: Arc<dyn Node>, config: SubgraphConfig) -> Self {
        Self {
            agent,
            tools,
            config,
        }
    }

    /// Subgraph configuration
    pub fn config(&self) -> &SubgraphConfig {
        &self.config
    }

    /// Run the loop to completion
    ///
    /// On reaching the iteration cap `state.answer` is replaced by the
    /// configured exhausted message. Errors from the agent node propagate.
    pub async fn run(
        &self,
        state: &mut TurnState,
        context: &ExecutionContext,
    ) -> MemoirResult<SubgraphOutcome> {
        let mut iterations = 0;
        let mut step = Step::MemoryAgent;

        loop {
            step = match step {
                Step::MemoryAgent => {
                    iterations += 1;
                    debug!(
                        turn_id = %context.turn_id,
                        iteration = iterations,
                        node = %self.agent.id(),
                        "Running node"
                    );
                    self.agent.execute(state, context).await?;

                    match route_tools(state) {
                        Step::Tools if iterations >= self.config.max_iterations => {
                            warn!(
                                turn_id = %context.turn_id,
                                user_id = %state.user_id,
                                iterations,
                                "Iteration cap reached, abandoning tool loop"
                            );
                            state.answer = self.config.exhausted_message.clone();
                            return Ok(SubgraphOutcome::Exhausted { iterations });
                        }
                        next => next,
                    }
                }
                Step::Tools => {
                    debug!(
                        turn_id = %context.turn_id,
                        iteration = iterations,
                        node = %self.tools.id(),
                        "Running node"
                    );
                    self.tools.execute(state, context).await?;
                    Step::MemoryAgent
                }
                Step::End => {
                    info!(turn_id = %context.turn_id, iterations, "Memory subgraph finished");
                    return Ok(SubgraphOutcome::Completed { iterations });
                }
            };
        }
    }
}
