//! Tunables for the memory subgraph and the turn controller

use std::time::Duration;

/// Memory subgraph configuration
#[derive(Debug, Clone)]
pub struct SubgraphConfig {
    /// Maximum number of memory agent invocations per turn
    pub max_iterations: usize,

    /// Answer used when the model still requests tools at the cap
    pub exhausted_message: String,
}

impl Default for SubgraphConfig {
    fn default() -> Self {
        Self {
            max_iterations: 8,
            exhausted_message:
                "Sorry, I could not finish working on that. Please try rephrasing your request."
                    .to_string(),
        }
    }
}

impl SubgraphConfig {
    /// Set the iteration cap (at least 1)
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    /// Set the answer used at the iteration cap
    pub fn with_exhausted_message(mut self, message: impl Into<String>) -> Self {
        self.exhausted_message = message.into();
        self
    }
}

/// Turn controller configuration
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Number of transcript entries loaded into the conversation window
    pub history_window: usize,

    /// Number of recall facts retrieved for the query
    pub recall_top_k: usize,

    /// Upper bound on one turn, from context load to answer
    pub turn_timeout: Duration,

    /// Generic apology for failed turns
    pub failure_message: String,

    /// Answer used when the turn times out
    pub timeout_message: String,

    /// Answer used when the model replies with empty text
    pub empty_answer_message: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            history_window: 6,
            recall_top_k: 5,
            turn_timeout: Duration::from_secs(120),
            failure_message:
                "An error occurred while processing your message. Please try again later."
                    .to_string(),
            timeout_message: "Sorry, that took too long. Please try again.".to_string(),
            empty_answer_message: "Sorry, an error occurred.".to_string(),
        }
    }
}

impl ControllerConfig {
    /// Set the conversation window size
    pub fn with_history_window(mut self, history_window: usize) -> Self {
        self.history_window = history_window;
        self
    }

    /// Set the number of recall facts retrieved per turn
    pub fn with_recall_top_k(mut self, recall_top_k: usize) -> Self {
        self.recall_top_k = recall_top_k;
        self
    }

    /// Set the per-turn timeout
    pub fn with_turn_timeout(mut self, turn_timeout: Duration) -> Self {
        self.turn_timeout = turn_timeout;
        self
    }

    /// Set the generic failure answer
    pub fn with_failure_message(mut self, message: impl Into<String>) -> Self {
        self.failure_message = message.into();
        self
    }

    /// Set the timeout answer
    pub fn with_timeout_message(mut self, message: impl Into<String>) -> Self {
        self.timeout_message = message.into();
        self
    }
}
