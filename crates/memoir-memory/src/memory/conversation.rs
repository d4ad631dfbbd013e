//! Conversation transcript

use super::user::UserId;
use crate::error::MemoirResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use memoir_llm::ChatMessage;
use serde::{Deserialize, Serialize};

/// Author of a transcript entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    /// Message written by the user
    Human,

    /// Reply from the assistant. Any unrecognized stored role reads back as this.
    #[serde(other)]
    Assistant,
}

/// One entry of a user's transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// Author
    pub role: TurnRole,

    /// Text content
    pub content: String,

    /// When the entry was produced
    pub timestamp: DateTime<Utc>,
}

impl ConversationTurn {
    /// User-authored entry
    pub fn human(content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            role: TurnRole::Human,
            content: content.into(),
            timestamp,
        }
    }

    /// Assistant-authored entry
    pub fn assistant(content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
            timestamp,
        }
    }

    /// Map to a chat message: human entries become user messages, everything
    /// else an assistant message
    pub fn to_chat_message(&self) -> ChatMessage {
        match self.role {
            TurnRole::Human => ChatMessage::user(self.content.clone()),
            TurnRole::Assistant => ChatMessage::assistant(self.content.clone()),
        }
    }
}

/// Durable, append-only transcript per user
///
/// Backends keep the whole transcript in a single record per user, so
/// `append_turns` is a read-modify-write that must be serialized per user.
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    /// The last `limit` entries, oldest first
    async fn recent_turns(&self, user_id: UserId, limit: usize)
        -> MemoirResult<Vec<ConversationTurn>>;

    /// Append entries in order; returns the transcript length afterwards
    async fn append_turns(&self, user_id: UserId, turns: Vec<ConversationTurn>)
        -> MemoirResult<usize>;

    /// The full transcript, oldest first
    async fn transcript(&self, user_id: UserId) -> MemoirResult<Vec<ConversationTurn>>;
}

/// Keep the last `limit` entries of a transcript
pub(crate) fn tail(mut turns: Vec<ConversationTurn>, limit: usize) -> Vec<ConversationTurn> {
    if turns.len() > limit {
        turns.drain(..turns.len() - limit);
    }
    turns
}
