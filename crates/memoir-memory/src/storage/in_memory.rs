//! In-memory backends for tests, demos and single-process runs

use super::locks::UserLocks;
use crate::error::MemoirResult;
use crate::memory::{
    apply_core_fact, tail, ConversationTurn, CoreFactStore, CoreFactUpdate, Document, Embedding,
    EmbeddingProvider, MetadataFilter, SearchResult, TranscriptStore, User, UserId, UserStore,
    VectorStore,
};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Default)]
struct UserTable {
    by_external_id: HashMap<i64, User>,
    next_id: i64,
}

/// Users, transcripts and core facts held in process memory
#[derive(Debug, Default)]
pub struct InMemoryStore {
    users: Mutex<UserTable>,
    transcripts: DashMap<UserId, Vec<ConversationTurn>>,
    core_facts: DashMap<UserId, Vec<String>>,
    locks: UserLocks,
}

impl InMemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of known users
    pub fn user_count(&self) -> usize {
        self.users.lock().by_external_id.len()
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn get_or_create_user(
        &self,
        external_id: i64,
        display_name: Option<&str>,
    ) -> MemoirResult<User> {
        let mut table = self.users.lock();

        if let Some(user) = table.by_external_id.get(&external_id) {
            return Ok(user.clone());
        }

        table.next_id += 1;
        let user = User {
            id: UserId(table.next_id),
            external_id,
            display_name: display_name.map(str::to_string),
            created_at: Utc::now(),
        };
        table.by_external_id.insert(external_id, user.clone());

        debug!(user_id = %user.id, external_id, "Created user");
        Ok(user)
    }
}

#[async_trait]
impl TranscriptStore for InMemoryStore {
    async fn recent_turns(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> MemoirResult<Vec<ConversationTurn>> {
        let turns = self
            .transcripts
            .get(&user_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default();

        Ok(tail(turns, limit))
    }

    async fn append_turns(
        &self,
        user_id: UserId,
        turns: Vec<ConversationTurn>,
    ) -> MemoirResult<usize> {
        let _guard = self.locks.lock(user_id).await;

        let mut transcript = self.transcripts.entry(user_id).or_default();
        transcript.extend(turns);
        Ok(transcript.len())
    }

    async fn transcript(&self, user_id: UserId) -> MemoirResult<Vec<ConversationTurn>> {
        Ok(self
            .transcripts
            .get(&user_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default())
    }
}

#[async_trait]
impl CoreFactStore for InMemoryStore {
    async fn core_facts(&self, user_id: UserId) -> MemoirResult<Vec<String>> {
        Ok(self
            .core_facts
            .get(&user_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default())
    }

    async fn store_core_fact(
        &self,
        user_id: UserId,
        text: &str,
        index: Option<i64>,
    ) -> MemoirResult<CoreFactUpdate> {
        let _guard = self.locks.lock(user_id).await;

        let mut facts = self.core_facts.entry(user_id).or_default();
        Ok(apply_core_fact(&mut facts, text.to_string(), index))
    }
}

/// Brute-force cosine search over documents held in memory
pub struct InMemoryVectorStore {
    embedder: Arc<dyn EmbeddingProvider>,
    entries: RwLock<Vec<(Document, Embedding)>>,
}

impl InMemoryVectorStore {
    /// Create an empty store that embeds with `embedder`
    pub fn new(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            embedder,
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Number of stored documents
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the store holds no documents
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn add_documents(&self, documents: Vec<Document>) -> MemoirResult<Vec<String>> {
        let mut embedded = Vec::with_capacity(documents.len());
        for document in documents {
            let embedding = self.embedder.embed(&document.content).await?;
            embedded.push((document, embedding));
        }

        let ids = embedded.iter().map(|(doc, _)| doc.id.clone()).collect();
        self.entries.write().extend(embedded);
        Ok(ids)
    }

    async fn similarity_search(
        &self,
        query: &str,
        k: usize,
        filter: &MetadataFilter,
    ) -> MemoirResult<Vec<Document>> {
        let query_embedding = self.embedder.embed(query).await?;

        let mut results = Vec::new();
        for (document, embedding) in self.entries.read().iter() {
            if !filter.matches(&document.metadata) {
                continue;
            }
            let score = query_embedding.cosine_similarity(embedding)?;
            results.push(SearchResult::new(document.clone(), score));
        }

        Ok(crate::memory::top_k(results, k)
            .into_iter()
            .map(|result| result.item)
            .collect())
    }
}
