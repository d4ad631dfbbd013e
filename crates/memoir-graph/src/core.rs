//! Node abstraction and execution context

use crate::state::TurnState;
use async_trait::async_trait;
use memoir_memory::{MemoirResult, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of a node within a graph
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(String);

impl NodeId {
    /// Create a node id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The memory agent node
    pub fn memory_agent() -> Self {
        Self::new("memory_agent")
    }

    /// The tool dispatch node
    pub fn tools() -> Self {
        Self::new("tools")
    }

    /// Borrow the id as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Outcome of a node execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionResult {
    /// The node updated the state; follow the outgoing edge
    Continue,

    /// The node had nothing to do and left the state untouched
    Passthrough,
}

/// Per-turn context handed to every node
///
/// Carries the caller identity so tools never take it from model arguments.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// Graph being executed
    pub graph_id: String,

    /// User the turn belongs to
    pub user_id: Option<UserId>,

    /// Unique id of this turn, for log correlation
    pub turn_id: Uuid,
}

impl ExecutionContext {
    /// Create a context for one execution of `graph_id`
    pub fn new(graph_id: impl Into<String>) -> Self {
        Self {
            graph_id: graph_id.into(),
            user_id: None,
            turn_id: Uuid::new_v4(),
        }
    }

    /// Attach the caller identity
    pub fn with_user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }
}

/// A unit of work in a graph
#[async_trait]
pub trait Node: Send + Sync {
    /// Run the node against the turn state
    async fn execute(
        &self,
        state: &mut TurnState,
        context: &ExecutionContext,
    ) -> MemoirResult<ExecutionResult>;

    /// Node identifier
    fn id(&self) -> &NodeId;

    /// Human readable name
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_ids() {
        assert_eq!(NodeId::memory_agent().as_str(), "memory_agent");
        assert_eq!(NodeId::tools().to_string(), "tools");
        assert_eq!(NodeId::from("tools"), NodeId::tools());
    }

    #[test]
    fn test_context_carries_user() {
        let anonymous = ExecutionContext::new("memory_subgraph");
        assert!(anonymous.user_id.is_none());

        let context = anonymous.clone().with_user(UserId(9));
        assert_eq!(context.user_id, Some(UserId(9)));
        assert_eq!(context.turn_id, anonymous.turn_id);
    }
}
