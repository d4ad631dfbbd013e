//! Outer turn controller
//!
//! One turn: load the conversation window and memory context, run the memory
//! subgraph, persist the exchange, answer. Turns of the same user are
//! serialized; turns of different users run independently.

use crate::config::ControllerConfig;
use crate::core::ExecutionContext;
use crate::state::TurnState;
use crate::subgraph::{MemorySubgraph, SubgraphOutcome, MEMORY_SUBGRAPH_ID};
use chrono::{DateTime, Utc};
use memoir_llm::ChatMessage;
use memoir_memory::{
    ConversationTurn, MemoirResult, MemoryTools, TranscriptStore, UserId, UserLocks,
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// How a turn ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The model produced the answer
    Answered,

    /// The tool loop hit the iteration cap
    Exhausted,

    /// The turn exceeded its timeout
    TimedOut,

    /// The turn failed; the answer is the generic apology
    Failed,
}

/// Result of one turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReply {
    /// Text delivered to the user
    pub answer: String,

    /// How the turn ended
    pub outcome: TurnOutcome,

    /// Whether the exchange was appended to the transcript
    pub persisted: bool,
}

/// Runs turns end to end
pub struct TurnController {
    transcripts: Arc<dyn TranscriptStore>,
    tools: MemoryTools,
    subgraph: Arc<MemorySubgraph>,
    config: ControllerConfig,
    turn_locks: UserLocks,
}

impl TurnController {
    /// Create a controller
    pub fn new(
        transcripts: Arc<dyn TranscriptStore>,
        tools: MemoryTools,
        subgraph: Arc<MemorySubgraph>,
        config: ControllerConfig,
    ) -> Self {
        Self {
            transcripts,
            tools,
            subgraph,
            config,
            turn_locks: UserLocks::new(),
        }
    }

    /// Controller configuration
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Run a turn and return only the answer text
    pub async fn process_message(&self, user_id: UserId, text: &str) -> String {
        self.handle_turn(user_id, text).await.answer
    }

    /// Run a turn
    ///
    /// Never fails: model errors turn into the failure message, a timeout into
    /// the timeout message. Anything but a failed turn is persisted as a human
    /// and an assistant entry in one append.
    pub async fn handle_turn(&self, user_id: UserId, text: &str) -> TurnReply {
        let _turn = self.turn_locks.lock(user_id).await;

        let started_at = Utc::now();
        let context = ExecutionContext::new(MEMORY_SUBGRAPH_ID).with_user(user_id);
        info!(turn_id = %context.turn_id, %user_id, "Processing message");

        let run =
            tokio::time::timeout(self.config.turn_timeout, self.run_turn(text, &context)).await;

        let (answer, outcome) = match run {
            Ok(Ok(result)) => result,
            Ok(Err(err)) => {
                error!(turn_id = %context.turn_id, %user_id, error = %err, "Turn failed");
                // The human entry is dropped too, so every stored question
                // keeps its answer next to it
                return TurnReply {
                    answer: self.config.failure_message.clone(),
                    outcome: TurnOutcome::Failed,
                    persisted: false,
                };
            }
            Err(_) => {
                warn!(
                    turn_id = %context.turn_id,
                    %user_id,
                    timeout_secs = self.config.turn_timeout.as_secs_f64(),
                    "Turn timed out"
                );
                (self.config.timeout_message.clone(), TurnOutcome::TimedOut)
            }
        };

        let persisted = self.persist(user_id, text, started_at, &answer).await;
        info!(turn_id = %context.turn_id, %user_id, ?outcome, persisted, "Turn complete");

        TurnReply {
            answer,
            outcome,
            persisted,
        }
    }

    async fn run_turn(
        &self,
        text: &str,
        context: &ExecutionContext,
    ) -> MemoirResult<(String, TurnOutcome)> {
        let user_id = context
            .user_id
            .ok_or_else(|| memoir_memory::MemoirError::invalid_state("turn without a user"))?;

        let mut state = self.load_context(user_id, text).await;
        let outcome = self.subgraph.run(&mut state, context).await?;

        let outcome = match outcome {
            SubgraphOutcome::Completed { .. } => TurnOutcome::Answered,
            SubgraphOutcome::Exhausted { .. } => TurnOutcome::Exhausted,
        };

        let answer = if state.answer.trim().is_empty() {
            warn!(turn_id = %context.turn_id, %user_id, "Model returned an empty answer");
            self.config.empty_answer_message.clone()
        } else {
            state.answer
        };

        Ok((answer, outcome))
    }

    /// Build the turn state; every load degrades to empty on failure
    async fn load_context(&self, user_id: UserId, text: &str) -> TurnState {
        let (history, core, recall) = tokio::join!(
            self.transcripts.recent_turns(user_id, self.config.history_window),
            self.tools.core_facts(user_id),
            self.tools.recall(user_id, text, self.config.recall_top_k),
        );

        let mut messages: Vec<ChatMessage> = history
            .unwrap_or_else(|err| {
                warn!(%user_id, error = %err, "Failed to load history, continuing without it");
                Vec::new()
            })
            .iter()
            .map(ConversationTurn::to_chat_message)
            .collect();
        messages.push(ChatMessage::user(text));

        let core_memories = core.unwrap_or_else(|err| {
            warn!(%user_id, error = %err, "Failed to load core memories");
            Vec::new()
        });
        let recall_memories = recall.unwrap_or_else(|err| {
            warn!(%user_id, error = %err, "Failed to load recall memories");
            Vec::new()
        });

        debug!(
            %user_id,
            message_count = messages.len(),
            core_count = core_memories.len(),
            recall_count = recall_memories.len(),
            "Loaded turn context"
        );

        TurnState::new(user_id, text)
            .with_messages(messages)
            .with_core_memories(core_memories)
            .with_recall_memories(recall_memories)
    }

    async fn persist(
        &self,
        user_id: UserId,
        text: &str,
        started_at: DateTime<Utc>,
        answer: &str,
    ) -> bool {
        let turns = vec![
            ConversationTurn::human(text, started_at),
            ConversationTurn::assistant(answer, Utc::now()),
        ];

        match self.transcripts.append_turns(user_id, turns).await {
            Ok(len) => {
                debug!(%user_id, transcript_len = len, "Transcript updated");
                true
            }
            Err(err) => {
                error!(%user_id, error = %err, "Failed to persist transcript");
                false
            }
        }
    }
}
