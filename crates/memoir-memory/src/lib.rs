//! # Memoir Memory
//!
//! Long-term, per-user memory for conversational agents.
//!
//! ## Memory Types
//!
//! - **Core facts**: a short ordered list of curated statements about the user
//!   (index 0 is the most recent). Insert-at-front or replace-at-index only.
//! - **Recall facts**: append-only statements indexed by embedding, retrieved by
//!   semantic similarity and always filtered to the owning user.
//! - **Transcript**: the ordered human/assistant history of one user.
//!
//! ## Storage
//!
//! Every memory type sits behind a trait ([`TranscriptStore`], [`CoreFactStore`],
//! [`VectorStore`], [`UserStore`]) with an in-memory backend and, behind the
//! `sqlite` feature, an `sqlx` backend. Read-modify-write of the single-row
//! records (transcript, core facts) is serialized per user.
//!
//! ## Tools
//!
//! [`MemoryTools`] exposes `save_recall_memory`, `search_memory` and
//! `store_core_memory` to the model. Tools never fail past their boundary; they
//! report failures as text.
//!
//! ## Example
//!
//! ```rust,no_run
//! use memoir_memory::{
//!     HashEmbeddingProvider, InMemoryStore, InMemoryVectorStore, MemoryTools, ToolContext, UserId,
//! };
//! use std::sync::Arc;
//!
//! # async fn example() {
//! let store = Arc::new(InMemoryStore::new());
//! let vectors = Arc::new(InMemoryVectorStore::new(Arc::new(HashEmbeddingProvider::new(256))));
//! let tools = MemoryTools::new(store, vectors);
//!
//! let ctx = ToolContext::for_user(UserId(1));
//! tools.save_recall_memory(&ctx, "likes espresso", Some("2024-01-01")).await;
//! let hits = tools.search_memory(&ctx, "coffee preference", 5).await;
//! assert!(hits[0].contains("Timestamp:2024-01-01"));
//! # }
//! ```

pub mod error;
pub mod memory;
pub mod storage;
pub mod tools;

pub use error::{MemoirError, MemoirResult};
pub use memory::{
    apply_core_fact, format_recall, ClientEmbeddingProvider, ConversationTurn, CoreFactStore,
    CoreFactUpdate, Document, Embedding, EmbeddingProvider, HashEmbeddingProvider, MetadataFilter,
    RecallFact, SearchResult, TranscriptStore, TurnRole, User, UserId, UserStore, VectorStore,
};
pub use storage::{InMemoryStore, InMemoryVectorStore, UserLocks};
#[cfg(feature = "sqlite")]
pub use storage::{SqliteStore, SqliteVectorStore};
pub use tools::{MemoryTool, MemoryTools, ToolContext, ToolOutput};
