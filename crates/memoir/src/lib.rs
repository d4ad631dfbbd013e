//! # Memoir - Conversational agents that remember
//!
//! **Memoir** gives a chat assistant per-user long-term memory:
//!
//! - **Memoir LLM**: OpenAI-compatible chat + embeddings client with function calling
//! - **Memoir Memory**: core facts, semantically searchable recall facts,
//!   transcripts and the memory tools the model calls
//! - **Memoir Graph**: the turn controller and its bounded agent/tool loop
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use memoir::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::new(ClientConfig::new(std::env::var("OPENAI_API_KEY")?))?;
//!
//!     let store = Arc::new(InMemoryStore::new());
//!     let embedder = Arc::new(ClientEmbeddingProvider::new(client.clone()));
//!     let tools = MemoryTools::new(store.clone(), Arc::new(InMemoryVectorStore::new(embedder)));
//!
//!     let subgraph = Arc::new(MemorySubgraph::new(
//!         Arc::new(client),
//!         tools.clone(),
//!         SubgraphConfig::default(),
//!     ));
//!     let controller = TurnController::new(store, tools, subgraph, ControllerConfig::default());
//!
//!     let answer = controller.process_message(UserId(1), "My name is Alex").await;
//!     println!("{}", answer);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! inbound message
//!       |
//!  TurnController -- load window, core facts, recall facts
//!       |
//!  MemorySubgraph -- memory_agent <-> tools (bounded)
//!       |
//!  TurnController -- append human + assistant entries
//!       |
//!    answer
//! ```

#![doc(html_root_url = "https://docs.rs/memoir/0.1.0")]
#![warn(missing_docs)]

// Re-export sub-crates
#[cfg(feature = "llm")]
pub use memoir_llm as llm;

#[cfg(feature = "memory")]
pub use memoir_memory as memory;

#[cfg(feature = "graph")]
pub use memoir_graph as graph;

/// Commonly used types and traits
pub mod prelude {
    #[cfg(feature = "llm")]
    pub use crate::llm::{
        ChatMessage, ChatModel, ChatResponse, Client, ClientConfig, MessageRole, ToolCall,
    };

    #[cfg(feature = "memory")]
    pub use crate::memory::{
        ClientEmbeddingProvider, CoreFactStore, EmbeddingProvider, HashEmbeddingProvider,
        InMemoryStore, InMemoryVectorStore, MemoirError, MemoirResult, MemoryTool, MemoryTools,
        ToolContext, TranscriptStore, UserId, UserStore, VectorStore,
    };

    #[cfg(feature = "sqlite")]
    pub use crate::memory::{SqliteStore, SqliteVectorStore};

    #[cfg(feature = "graph")]
    pub use crate::graph::{
        ControllerConfig, ExecutionContext, InboundMessage, MemorySubgraph, MessageHandler,
        NodeId, SubgraphConfig, TurnController, TurnState,
    };
}
