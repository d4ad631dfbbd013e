//! Recall facts - append-only statements retrieved by semantic similarity
//!
//! Recall facts are stored as documents in a [`VectorStore`]. The owning user
//! id, a generated fact id and an optional event timestamp live in the document
//! metadata; the embedding is attached by the store at write time.

use super::user::UserId;
use crate::error::MemoirResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Metadata key holding the owning user id
pub const USER_ID_KEY: &str = "user_id";

/// Metadata key holding the fact id
pub const FACT_ID_KEY: &str = "fact_id";

/// Metadata key holding the optional event timestamp
pub const TIMESTAMP_KEY: &str = "timestamp";

/// A text document with free-form metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Store-assigned identifier
    pub id: String,

    /// Indexed text
    pub content: String,

    /// Arbitrary JSON metadata
    pub metadata: Map<String, Value>,
}

impl Document {
    /// Create a document with a fresh id and no metadata
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            content: content.into(),
            metadata: Map::new(),
        }
    }

    /// Add a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Equality filter on one metadata key
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataFilter {
    /// Metadata key
    pub key: String,

    /// Required value
    pub value: Value,
}

impl MetadataFilter {
    /// Filter on `key == value`
    pub fn eq(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Filter to documents owned by `user_id`
    pub fn user(user_id: UserId) -> Self {
        Self::eq(USER_ID_KEY, user_id.0)
    }

    /// Whether `metadata` satisfies the filter
    pub fn matches(&self, metadata: &Map<String, Value>) -> bool {
        metadata.get(&self.key) == Some(&self.value)
    }

    /// Filter value rendered the way SQLite's `json_extract` returns it as text
    pub fn value_as_text(&self) -> String {
        match &self.value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Similarity search engine over documents
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Embed and store documents; returns their ids
    async fn add_documents(&self, documents: Vec<Document>) -> MemoirResult<Vec<String>>;

    /// Up to `k` documents matching `filter`, most similar to `query` first
    async fn similarity_search(
        &self,
        query: &str,
        k: usize,
        filter: &MetadataFilter,
    ) -> MemoirResult<Vec<Document>>;
}

/// A statement about a user, stored for semantic recall
#[derive(Debug, Clone, PartialEq)]
pub struct RecallFact {
    /// Unique fact id
    pub fact_id: String,

    /// Owning user
    pub user_id: UserId,

    /// The statement
    pub text: String,

    /// When the described event happened, stored verbatim
    pub timestamp: Option<String>,
}

impl RecallFact {
    /// Create a fact with a fresh id
    pub fn new(user_id: UserId, text: impl Into<String>, timestamp: Option<String>) -> Self {
        Self {
            fact_id: uuid::Uuid::new_v4().to_string(),
            user_id,
            text: text.into(),
            timestamp,
        }
    }

    /// Convert into a document for the vector store
    pub fn into_document(self) -> Document {
        let document = Document::new(self.text)
            .with_metadata(USER_ID_KEY, self.user_id.0)
            .with_metadata(FACT_ID_KEY, self.fact_id);

        match self.timestamp {
            Some(timestamp) => document.with_metadata(TIMESTAMP_KEY, timestamp),
            None => document,
        }
    }
}

/// Render a recalled document as `"<text>"` or `"<text> Timestamp:<ts>"`
pub fn format_recall(document: &Document) -> String {
    match document.metadata.get(TIMESTAMP_KEY) {
        Some(Value::String(ts)) => format!("{} Timestamp:{}", document.content, ts),
        Some(Value::Null) | None => document.content.clone(),
        Some(other) => format!("{} Timestamp:{}", document.content, other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_recall_fact_metadata() {
        let document =
            RecallFact::new(UserId(7), "likes espresso", Some("2024-01-01".into())).into_document();

        assert_eq!(document.content, "likes espresso");
        assert_eq!(document.metadata[USER_ID_KEY], json!(7));
        assert_eq!(document.metadata[TIMESTAMP_KEY], json!("2024-01-01"));
        assert!(document.metadata[FACT_ID_KEY].as_str().is_some());

        let untimed = RecallFact::new(UserId(7), "has a cat", None).into_document();
        assert!(!untimed.metadata.contains_key(TIMESTAMP_KEY));
    }

    #[test]
    fn test_format_recall() {
        let timed = Document::new("likes espresso").with_metadata(TIMESTAMP_KEY, "2024-01-01");
        assert_eq!(format_recall(&timed), "likes espresso Timestamp:2024-01-01");

        let untimed = Document::new("has a cat");
        assert_eq!(format_recall(&untimed), "has a cat");
    }

    #[test]
    fn test_user_filter() {
        let filter = MetadataFilter::user(UserId(3));
        let own = Document::new("a").with_metadata(USER_ID_KEY, 3);
        let other = Document::new("b").with_metadata(USER_ID_KEY, 4);

        assert!(filter.matches(&own.metadata));
        assert!(!filter.matches(&other.metadata));
        assert!(!filter.matches(&Document::new("c").metadata));
        assert_eq!(filter.value_as_text(), "3");
    }
}
