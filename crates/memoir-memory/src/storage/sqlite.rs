//! SQLite backends (via `sqlx`)
//!
//! Transcripts and core facts are single JSON rows per user, rewritten under
//! the user's lock inside a transaction. Each of those transactions opens with
//! a write, so it holds the database write lock before it reads the row and
//! concurrent writers for other users wait out the busy timeout instead of
//! failing with `SQLITE_BUSY`. Recall documents store their embedding
//! as a JSON array and are ranked by brute-force cosine similarity after an
//! SQL-side metadata filter.

use super::locks::UserLocks;
use crate::error::{MemoirError, MemoirResult};
use crate::memory::{
    apply_core_fact, tail, top_k, ConversationTurn, CoreFactStore, CoreFactUpdate, Document,
    Embedding, EmbeddingProvider, MetadataFilter, SearchResult, TranscriptStore, User, UserId,
    UserStore, VectorStore,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

const STORE_MIGRATIONS: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        external_id INTEGER NOT NULL UNIQUE,
        display_name TEXT,
        created_at TEXT NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS message_histories (
        user_id INTEGER PRIMARY KEY,
        messages TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS memories (
        user_id INTEGER PRIMARY KEY,
        facts TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )"#,
];

const VECTOR_MIGRATIONS: &[&str] = &[r#"CREATE TABLE IF NOT EXISTS user_facts_vector_store (
        id TEXT PRIMARY KEY,
        content TEXT NOT NULL,
        embedding TEXT NOT NULL,
        metadata TEXT NOT NULL,
        created_at TEXT NOT NULL
    )"#];

fn storage_err(operation: &'static str) -> impl FnOnce(sqlx::Error) -> MemoirError {
    move |err| MemoirError::storage(operation, err)
}

fn decode_err(operation: &'static str) -> impl FnOnce(serde_json::Error) -> MemoirError {
    move |err| MemoirError::storage(operation, err)
}

/// Open a pool. In-memory databases are pinned to one long-lived connection,
/// otherwise every new connection would see an empty database. File databases
/// run in WAL mode so readers never block the writer.
async fn open_pool(url: &str) -> MemoirResult<SqlitePool> {
    let in_memory = url.contains(":memory:");

    let mut options = SqliteConnectOptions::from_str(url)
        .map_err(storage_err("connect"))?
        .create_if_missing(true)
        .busy_timeout(BUSY_TIMEOUT);
    if !in_memory {
        options = options.journal_mode(SqliteJournalMode::Wal);
    }

    let pool_options = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
    } else {
        SqlitePoolOptions::new().max_connections(5)
    };

    pool_options
        .connect_with(options)
        .await
        .map_err(storage_err("connect"))
}

async fn migrate(pool: &SqlitePool, statements: &[&str]) -> MemoirResult<()> {
    for statement in statements {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(storage_err("migrate"))?;
    }
    Ok(())
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    external_id: i64,
    display_name: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: UserId(row.id),
            external_id: row.external_id,
            display_name: row.display_name,
            created_at: row.created_at,
        }
    }
}

/// Users, transcripts and core facts in SQLite
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    locks: UserLocks,
}

impl SqliteStore {
    /// Connect to `url` (e.g. `sqlite://memoir.db` or `sqlite::memory:`) and
    /// create the tables if needed
    pub async fn connect(url: &str) -> MemoirResult<Self> {
        let pool = open_pool(url).await?;
        let store = Self::from_pool(pool).await?;
        info!("Connected conversation store");
        Ok(store)
    }

    /// Wrap an existing pool and create the tables if needed
    pub async fn from_pool(pool: SqlitePool) -> MemoirResult<Self> {
        migrate(&pool, STORE_MIGRATIONS).await?;
        Ok(Self {
            pool,
            locks: UserLocks::new(),
        })
    }

    /// Underlying pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close all connections
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn load_transcript(&self, user_id: UserId) -> MemoirResult<Vec<ConversationTurn>> {
        let raw: Option<String> =
            sqlx::query_scalar("SELECT messages FROM message_histories WHERE user_id = ?")
                .bind(user_id.0)
                .fetch_optional(&self.pool)
                .await
                .map_err(storage_err("load_transcript"))?;

        match raw {
            Some(raw) => serde_json::from_str(&raw).map_err(decode_err("load_transcript")),
            None => Ok(Vec::new()),
        }
    }
}

#[async_trait]
impl UserStore for SqliteStore {
    async fn get_or_create_user(
        &self,
        external_id: i64,
        display_name: Option<&str>,
    ) -> MemoirResult<User> {
        let inserted = sqlx::query(
            "INSERT INTO users (external_id, display_name, created_at) VALUES (?, ?, ?) \
             ON CONFLICT(external_id) DO NOTHING",
        )
        .bind(external_id)
        .bind(display_name)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(storage_err("get_or_create_user"))?;

        let row: UserRow = sqlx::query_as(
            "SELECT id, external_id, display_name, created_at FROM users WHERE external_id = ?",
        )
        .bind(external_id)
        .fetch_one(&self.pool)
        .await
        .map_err(storage_err("get_or_create_user"))?;

        if inserted.rows_affected() > 0 {
            debug!(user_id = row.id, external_id, "Created user");
        }
        Ok(row.into())
    }
}

#[async_trait]
impl TranscriptStore for SqliteStore {
    async fn recent_turns(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> MemoirResult<Vec<ConversationTurn>> {
        Ok(tail(self.load_transcript(user_id).await?, limit))
    }

    async fn append_turns(
        &self,
        user_id: UserId,
        turns: Vec<ConversationTurn>,
    ) -> MemoirResult<usize> {
        let _guard = self.locks.lock(user_id).await;
        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(storage_err("append_turns"))?;

        // Write before reading: takes the write lock for the whole transaction
        sqlx::query(
            "INSERT INTO message_histories (user_id, messages, created_at, updated_at) \
             VALUES (?, '[]', ?, ?) ON CONFLICT(user_id) DO NOTHING",
        )
        .bind(user_id.0)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(storage_err("append_turns"))?;

        let raw: String =
            sqlx::query_scalar("SELECT messages FROM message_histories WHERE user_id = ?")
                .bind(user_id.0)
                .fetch_one(&mut *tx)
                .await
                .map_err(storage_err("append_turns"))?;

        let mut transcript: Vec<ConversationTurn> =
            serde_json::from_str(&raw).map_err(decode_err("append_turns"))?;
        transcript.extend(turns);
        let encoded = serde_json::to_string(&transcript).map_err(decode_err("append_turns"))?;

        sqlx::query("UPDATE message_histories SET messages = ?, updated_at = ? WHERE user_id = ?")
            .bind(encoded)
            .bind(now)
            .bind(user_id.0)
            .execute(&mut *tx)
            .await
            .map_err(storage_err("append_turns"))?;

        tx.commit().await.map_err(storage_err("append_turns"))?;
        Ok(transcript.len())
    }

    async fn transcript(&self, user_id: UserId) -> MemoirResult<Vec<ConversationTurn>> {
        self.load_transcript(user_id).await
    }
}

#[async_trait]
impl CoreFactStore for SqliteStore {
    async fn core_facts(&self, user_id: UserId) -> MemoirResult<Vec<String>> {
        let raw: Option<String> = sqlx::query_scalar("SELECT facts FROM memories WHERE user_id = ?")
            .bind(user_id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_err("core_facts"))?;

        match raw {
            Some(raw) => serde_json::from_str(&raw).map_err(decode_err("core_facts")),
            None => Ok(Vec::new()),
        }
    }

    async fn store_core_fact(
        &self,
        user_id: UserId,
        text: &str,
        index: Option<i64>,
    ) -> MemoirResult<CoreFactUpdate> {
        let _guard = self.locks.lock(user_id).await;
        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(storage_err("store_core_fact"))?;

        // Write before reading, as in append_turns
        sqlx::query(
            "INSERT INTO memories (user_id, facts, created_at, updated_at) \
             VALUES (?, '[]', ?, ?) ON CONFLICT(user_id) DO NOTHING",
        )
        .bind(user_id.0)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(storage_err("store_core_fact"))?;

        let raw: String = sqlx::query_scalar("SELECT facts FROM memories WHERE user_id = ?")
            .bind(user_id.0)
            .fetch_one(&mut *tx)
            .await
            .map_err(storage_err("store_core_fact"))?;

        let mut facts: Vec<String> =
            serde_json::from_str(&raw).map_err(decode_err("store_core_fact"))?;
        let update = apply_core_fact(&mut facts, text.to_string(), index);
        let encoded = serde_json::to_string(&facts).map_err(decode_err("store_core_fact"))?;

        sqlx::query("UPDATE memories SET facts = ?, updated_at = ? WHERE user_id = ?")
            .bind(encoded)
            .bind(now)
            .bind(user_id.0)
            .execute(&mut *tx)
            .await
            .map_err(storage_err("store_core_fact"))?;

        tx.commit().await.map_err(storage_err("store_core_fact"))?;
        Ok(update)
    }
}

#[derive(sqlx::FromRow)]
struct VectorRow {
    id: String,
    content: String,
    embedding: String,
    metadata: String,
}

/// Recall documents in SQLite, searched by brute-force cosine similarity
pub struct SqliteVectorStore {
    pool: SqlitePool,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl SqliteVectorStore {
    /// Connect to `url` and create the table if needed
    pub async fn connect(url: &str, embedder: Arc<dyn EmbeddingProvider>) -> MemoirResult<Self> {
        let pool = open_pool(url).await?;
        let store = Self::from_pool(pool, embedder).await?;
        info!(model = store.embedder.model_name(), "Connected recall store");
        Ok(store)
    }

    /// Wrap an existing pool and create the table if needed
    pub async fn from_pool(
        pool: SqlitePool,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> MemoirResult<Self> {
        migrate(&pool, VECTOR_MIGRATIONS).await?;
        Ok(Self { pool, embedder })
    }

    /// Close all connections
    pub async fn close(&self) {
        self.pool.close().await;
    }

    fn decode_row(&self, row: VectorRow) -> MemoirResult<(Document, Embedding)> {
        let vector: Vec<f32> =
            serde_json::from_str(&row.embedding).map_err(decode_err("similarity_search"))?;
        let metadata =
            serde_json::from_str(&row.metadata).map_err(decode_err("similarity_search"))?;

        let document = Document {
            id: row.id,
            content: row.content,
            metadata,
        };
        Ok((document, Embedding::new(vector, self.embedder.model_name())))
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    async fn add_documents(&self, documents: Vec<Document>) -> MemoirResult<Vec<String>> {
        let mut embedded = Vec::with_capacity(documents.len());
        for document in documents {
            let embedding = self.embedder.embed(&document.content).await?;
            embedded.push((document, embedding));
        }

        let mut tx = self.pool.begin().await.map_err(storage_err("add_documents"))?;
        let mut ids = Vec::with_capacity(embedded.len());

        for (document, embedding) in embedded {
            let vector =
                serde_json::to_string(&embedding.vector).map_err(decode_err("add_documents"))?;
            let metadata =
                serde_json::to_string(&document.metadata).map_err(decode_err("add_documents"))?;

            sqlx::query(
                "INSERT INTO user_facts_vector_store (id, content, embedding, metadata, created_at) \
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&document.id)
            .bind(&document.content)
            .bind(vector)
            .bind(metadata)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await
            .map_err(storage_err("add_documents"))?;

            ids.push(document.id);
        }

        tx.commit().await.map_err(storage_err("add_documents"))?;
        Ok(ids)
    }

    async fn similarity_search(
        &self,
        query: &str,
        k: usize,
        filter: &MetadataFilter,
    ) -> MemoirResult<Vec<Document>> {
        let query_embedding = self.embedder.embed(query).await?;

        let rows: Vec<VectorRow> = sqlx::query_as(
            "SELECT id, content, embedding, metadata FROM user_facts_vector_store \
             WHERE CAST(json_extract(metadata, ?) AS TEXT) = ?",
        )
        .bind(format!("$.\"{}\"", filter.key))
        .bind(filter.value_as_text())
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err("similarity_search"))?;

        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            let (document, embedding) = self.decode_row(row)?;
            // json_extract compares loosely; keep the exact JSON match
            if !filter.matches(&document.metadata) {
                continue;
            }

            match query_embedding.cosine_similarity(&embedding) {
                Ok(score) => results.push(SearchResult::new(document, score)),
                Err(err) => warn!(document_id = %document.id, error = %err, "Skipping document"),
            }
        }

        Ok(top_k(results, k).into_iter().map(|result| result.item).collect())
    }
}
