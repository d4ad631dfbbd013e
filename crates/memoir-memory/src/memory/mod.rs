//! # Per-user memory model
//!
//! - **User**: identity record keyed by the platform id
//! - **Conversation**: the transcript of human/assistant turns
//! - **Core**: ordered core facts
//! - **Recall**: similarity-indexed recall facts
//! - **Vector**: embeddings and similarity scoring

mod conversation;
mod core_facts;
mod recall;
mod user;
mod vector;

pub(crate) use conversation::tail;
pub(crate) use vector::top_k;

pub use conversation::{ConversationTurn, TranscriptStore, TurnRole};
pub use core_facts::{apply_core_fact, CoreFactStore, CoreFactUpdate};
pub use recall::{format_recall, Document, MetadataFilter, RecallFact, VectorStore};
pub use user::{User, UserId, UserStore};
pub use vector::{
    ClientEmbeddingProvider, Embedding, EmbeddingProvider, HashEmbeddingProvider, SearchResult,
};
