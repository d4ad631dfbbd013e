//! Turn state - ephemeral working data of one turn

use memoir_llm::ChatMessage;
use memoir_memory::UserId;
use serde::{Deserialize, Serialize};

/// Working data of a single turn's decision loop
///
/// Created by the controller, mutated by every node of the memory subgraph and
/// dropped when the turn completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnState {
    /// User the turn belongs to
    pub user_id: UserId,

    /// The inbound text
    pub query: String,

    /// Conversation window plus everything produced during the turn
    pub messages: Vec<ChatMessage>,

    /// Core-fact snapshot, index 0 first
    pub core_memories: Vec<String>,

    /// Formatted recall facts relevant to the query
    pub recall_memories: Vec<String>,

    /// Text of the latest model response
    pub answer: String,
}

impl TurnState {
    /// Fresh state with no messages or memories
    pub fn new(user_id: UserId, query: impl Into<String>) -> Self {
        Self {
            user_id,
            query: query.into(),
            messages: Vec::new(),
            core_memories: Vec::new(),
            recall_memories: Vec::new(),
            answer: String::new(),
        }
    }

    /// Seed the conversation window
    pub fn with_messages(mut self, messages: Vec<ChatMessage>) -> Self {
        self.messages = messages;
        self
    }

    /// Set the core-fact snapshot
    pub fn with_core_memories(mut self, core_memories: Vec<String>) -> Self {
        self.core_memories = core_memories;
        self
    }

    /// Set the recall-fact snapshot
    pub fn with_recall_memories(mut self, recall_memories: Vec<String>) -> Self {
        self.recall_memories = recall_memories;
        self
    }

    /// Most recent message, if any
    pub fn last_message(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }
}
