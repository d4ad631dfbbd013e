//! Storage backends for users, transcripts, core facts and recall documents

mod in_memory;
mod locks;
#[cfg(feature = "sqlite")]
mod sqlite;

pub use in_memory::{InMemoryStore, InMemoryVectorStore};
pub use locks::UserLocks;
#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteStore, SqliteVectorStore};
