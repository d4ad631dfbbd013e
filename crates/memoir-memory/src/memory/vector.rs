//! Vector embeddings and similarity search
//!
//! Provides embedding generation and cosine similarity for recall facts.
//! Supports multiple embedding backends.

use crate::error::{MemoirError, MemoirResult};
use memoir_llm::{Client, DEFAULT_EMBEDDING_DIMENSIONS};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};

/// A vector embedding (dense float vector)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
    /// The vector dimensions
    pub vector: Vec<f32>,

    /// Dimensionality of the embedding
    pub dimensions: usize,

    /// Model used to generate the embedding
    pub model: String,
}

impl Embedding {
    /// Create a new embedding
    pub fn new(vector: Vec<f32>, model: impl Into<String>) -> Self {
        let dimensions = vector.len();
        Self {
            vector,
            dimensions,
            model: model.into(),
        }
    }

    /// Calculate cosine similarity with another embedding
    pub fn cosine_similarity(&self, other: &Embedding) -> MemoirResult<f32> {
        if self.dimensions != other.dimensions {
            return Err(MemoirError::validation(
                "embedding_dimensions",
                "dimensions must match",
                format!("{} vs {}", self.dimensions, other.dimensions),
            ));
        }

        let dot_product: f32 = self
            .vector
            .iter()
            .zip(other.vector.iter())
            .map(|(a, b)| a * b)
            .sum();

        let norm_a: f32 = self.vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = other.vector.iter().map(|x| x * x).sum::<f32>().sqrt();

        if norm_a == 0.0 || norm_b == 0.0 {
            return Ok(0.0);
        }

        Ok(dot_product / (norm_a * norm_b))
    }
}

/// Trait for embedding generation backends
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding for the given text
    async fn embed(&self, text: &str) -> MemoirResult<Embedding>;

    /// Get the model name
    fn model_name(&self) -> &str;

    /// Get the embedding dimensions
    fn dimensions(&self) -> usize;
}

/// Feature-hashed bag-of-words embeddings (for tests and offline runs)
///
/// Texts that share words land close together; there is no notion of
/// synonyms. NOT for production.
pub struct HashEmbeddingProvider {
    dimensions: usize,
}

impl HashEmbeddingProvider {
    /// Create a new hash-based embedding provider
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    fn hash_embed(&self, text: &str) -> Vec<f32> {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut vector = vec![0.0; self.dimensions];

        let tokens = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|token| !token.is_empty())
            .map(str::to_lowercase);

        for token in tokens {
            let mut hasher = DefaultHasher::new();
            token.hash(&mut hasher);
            let hash = hasher.finish();

            let bucket = (hash % self.dimensions as u64) as usize;
            let sign = if (hash >> 63) == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        vector
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for HashEmbeddingProvider {
    async fn embed(&self, text: &str) -> MemoirResult<Embedding> {
        Ok(Embedding::new(self.hash_embed(text), "hash"))
    }

    fn model_name(&self) -> &str {
        "hash-embedding"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Embeddings from the LLM client's `embeddings` endpoint
///
/// Reports the configured size until the first embedding arrives, then the
/// size the provider actually returned.
pub struct ClientEmbeddingProvider {
    client: Client,
    dimensions: AtomicUsize,
}

impl ClientEmbeddingProvider {
    /// Wrap a client
    pub fn new(client: Client) -> Self {
        let dimensions = client
            .config()
            .embedding_dimensions
            .unwrap_or(DEFAULT_EMBEDDING_DIMENSIONS);
        Self {
            client,
            dimensions: AtomicUsize::new(dimensions),
        }
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for ClientEmbeddingProvider {
    async fn embed(&self, text: &str) -> MemoirResult<Embedding> {
        let vector = self.client.embed(text).await?;
        if !vector.is_empty() {
            self.dimensions.store(vector.len(), Ordering::Relaxed);
        }
        Ok(Embedding::new(vector, self.client.config().embedding_model.clone()))
    }

    fn model_name(&self) -> &str {
        &self.client.config().embedding_model
    }

    fn dimensions(&self) -> usize {
        self.dimensions.load(Ordering::Relaxed)
    }
}

/// Search result with similarity score
#[derive(Debug, Clone)]
pub struct SearchResult<T> {
    /// The item that was found
    pub item: T,

    /// Cosine similarity (higher is more similar)
    pub score: f32,
}

impl<T> SearchResult<T> {
    /// Create a new search result
    pub fn new(item: T, score: f32) -> Self {
        Self { item, score }
    }
}

/// Sort by descending score and keep the best `limit`
pub(crate) fn top_k<T>(mut results: Vec<SearchResult<T>>, limit: usize) -> Vec<SearchResult<T>> {
    results.sort_by(|a, b| b.score.total_cmp(&a.score));
    results.truncate(limit);
    results
}
