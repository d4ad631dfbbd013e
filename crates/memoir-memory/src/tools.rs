//! Memory tools exposed to the model
//!
//! Three tools: `save_recall_memory`, `search_memory` and `store_core_memory`.
//! Each reads the caller's identity from a [`ToolContext`] injected by the
//! dispatcher, never from model-supplied arguments. Storage failures are
//! reported to the model as text; only malformed arguments surface as errors.

use crate::error::{MemoirError, MemoirResult};
use crate::memory::{format_recall, CoreFactStore, MetadataFilter, RecallFact, UserId, VectorStore};
use memoir_llm::ToolDefinition;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

const RECALL_SAVED: &str = "Memory saved successfully";
const RECALL_FAILED: &str = "Failed to save memory";
const CORE_STORED: &str = "Core memory stored successfully";
const CORE_FAILED: &str = "Failed to store core memory";

/// Default number of results for `search_memory`
pub const DEFAULT_TOP_K: usize = 5;

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

/// Arguments of `save_recall_memory`
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SaveRecallMemoryArgs {
    /// Any fact about the user
    pub memory: String,

    /// Date or time when the remembered event happened
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Arguments of `search_memory`
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchMemoryArgs {
    /// Natural language query for relevant recall memories
    pub query: String,

    /// Number of results
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

/// Arguments of `store_core_memory`
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StoreCoreMemoryArgs {
    /// Core memory to store
    pub memory: String,

    /// Position of the memory in the list to replace
    #[serde(default)]
    pub index: Option<i64>,
}

/// The closed set of memory tools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryTool {
    /// Append a recall fact
    SaveRecallMemory,

    /// Similarity search over recall facts
    SearchMemory,

    /// Insert or replace a core fact
    StoreCoreMemory,
}

impl MemoryTool {
    /// Every tool, in name order
    pub const ALL: [MemoryTool; 3] = [
        MemoryTool::SaveRecallMemory,
        MemoryTool::SearchMemory,
        MemoryTool::StoreCoreMemory,
    ];

    /// Name the model calls the tool by
    pub fn name(self) -> &'static str {
        match self {
            MemoryTool::SaveRecallMemory => "save_recall_memory",
            MemoryTool::SearchMemory => "search_memory",
            MemoryTool::StoreCoreMemory => "store_core_memory",
        }
    }

    /// Look up a tool by name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.name() == name)
    }

    /// Names of every tool
    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|tool| tool.name()).collect()
    }

    fn description(self) -> &'static str {
        match self {
            MemoryTool::SaveRecallMemory => {
                "Save a recall memory to the vector store. Use for any fact about the user, \
                 optionally with the date or time it happened."
            }
            MemoryTool::SearchMemory => {
                "Search for relevant recall memories about the user with a natural language query."
            }
            MemoryTool::StoreCoreMemory => {
                "Store a core memory. Without an index the memory is added first; with an index \
                 it replaces the memory at that position."
            }
        }
    }

    /// Name, description and JSON-Schema parameters for the model
    pub fn definition(self) -> ToolDefinition {
        let schema = match self {
            MemoryTool::SaveRecallMemory => schemars::schema_for!(SaveRecallMemoryArgs),
            MemoryTool::SearchMemory => schemars::schema_for!(SearchMemoryArgs),
            MemoryTool::StoreCoreMemory => schemars::schema_for!(StoreCoreMemoryArgs),
        };
        let schema = parameters_schema(schema);
        ToolDefinition::new(self.name(), self.description(), schema)
    }
}

impl fmt::Display for MemoryTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn parameters_schema(mut schema: schemars::Schema) -> Value {
    schema.remove("$schema");
    schema.remove("title");
    schema.to_value()
}

/// Per-invocation context carrying the caller's identity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolContext {
    /// Internal id of the user the turn belongs to
    pub user_id: Option<UserId>,
}

impl ToolContext {
    /// Context for `user_id`
    pub fn for_user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
        }
    }
}

/// Result of a tool invocation
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    /// Status line
    Status(String),

    /// Formatted recall memories
    Memories(Vec<String>),
}

impl fmt::Display for ToolOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolOutput::Status(status) => f.write_str(status),
            ToolOutput::Memories(memories) => {
                let rendered = serde_json::to_string(memories).map_err(|_| fmt::Error)?;
                f.write_str(&rendered)
            }
        }
    }
}

/// The memory tools bound to their stores
#[derive(Clone)]
pub struct MemoryTools {
    core: Arc<dyn CoreFactStore>,
    recall: Arc<dyn VectorStore>,
}

impl MemoryTools {
    /// Bind the tools to a core-fact store and a recall vector store
    pub fn new(core: Arc<dyn CoreFactStore>, recall: Arc<dyn VectorStore>) -> Self {
        Self { core, recall }
    }

    /// Definitions of every tool, for binding to the model
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        MemoryTool::ALL.iter().map(|tool| tool.definition()).collect()
    }

    /// Save a recall fact for the caller
    pub async fn save_recall_memory(
        &self,
        ctx: &ToolContext,
        memory: &str,
        timestamp: Option<&str>,
    ) -> String {
        let Some(user_id) = ctx.user_id else {
            warn!(tool = "save_recall_memory", "No user in tool context");
            return RECALL_FAILED.to_string();
        };

        let timestamp = timestamp.map(str::trim).filter(|ts| !ts.is_empty());
        let fact = RecallFact::new(user_id, memory, timestamp.map(str::to_string));
        match self.recall.add_documents(vec![fact.into_document()]).await {
            Ok(_) => {
                debug!(%user_id, "Saved recall memory");
                RECALL_SAVED.to_string()
            }
            Err(err) => {
                warn!(%user_id, error = %err, "Failed to save recall memory");
                RECALL_FAILED.to_string()
            }
        }
    }

    /// Search the caller's recall facts; empty on any failure
    pub async fn search_memory(&self, ctx: &ToolContext, query: &str, top_k: usize) -> Vec<String> {
        let Some(user_id) = ctx.user_id else {
            warn!(tool = "search_memory", "No user in tool context");
            return Vec::new();
        };

        match self.recall(user_id, query, top_k).await {
            Ok(memories) => memories,
            Err(err) => {
                warn!(%user_id, error = %err, "Recall search failed");
                Vec::new()
            }
        }
    }

    /// Insert or replace a core fact for the caller
    pub async fn store_core_memory(
        &self,
        ctx: &ToolContext,
        memory: &str,
        index: Option<i64>,
    ) -> String {
        let Some(user_id) = ctx.user_id else {
            warn!(tool = "store_core_memory", "No user in tool context");
            return CORE_FAILED.to_string();
        };

        match self.core.store_core_fact(user_id, memory, index).await {
            Ok(update) => {
                debug!(%user_id, ?update, "Stored core memory");
                CORE_STORED.to_string()
            }
            Err(err) => {
                warn!(%user_id, error = %err, "Failed to store core memory");
                CORE_FAILED.to_string()
            }
        }
    }

    /// Up to `k` formatted recall facts of `user_id`, most similar first
    pub async fn recall(
        &self,
        user_id: UserId,
        query: &str,
        k: usize,
    ) -> MemoirResult<Vec<String>> {
        let documents = self
            .recall
            .similarity_search(query, k, &MetadataFilter::user(user_id))
            .await?;

        Ok(documents.iter().map(format_recall).collect())
    }

    /// Current core facts of `user_id`
    pub async fn core_facts(&self, user_id: UserId) -> MemoirResult<Vec<String>> {
        self.core.core_facts(user_id).await
    }

    /// Decode `args` and run `tool`
    ///
    /// Fails only when the arguments do not match the tool's schema.
    pub async fn invoke(
        &self,
        tool: MemoryTool,
        args: Value,
        ctx: &ToolContext,
    ) -> MemoirResult<ToolOutput> {
        let output = match tool {
            MemoryTool::SaveRecallMemory => {
                let args: SaveRecallMemoryArgs = decode_args(tool, args)?;
                ToolOutput::Status(
                    self.save_recall_memory(ctx, &args.memory, args.timestamp.as_deref())
                        .await,
                )
            }
            MemoryTool::SearchMemory => {
                let args: SearchMemoryArgs = decode_args(tool, args)?;
                ToolOutput::Memories(self.search_memory(ctx, &args.query, args.top_k).await)
            }
            MemoryTool::StoreCoreMemory => {
                let args: StoreCoreMemoryArgs = decode_args(tool, args)?;
                ToolOutput::Status(self.store_core_memory(ctx, &args.memory, args.index).await)
            }
        };

        Ok(output)
    }
}

fn decode_args<T: for<'de> Deserialize<'de>>(tool: MemoryTool, args: Value) -> MemoirResult<T> {
    serde_json::from_value(args).map_err(|err| MemoirError::tool(tool.name(), err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{Document, HashEmbeddingProvider};
    use crate::storage::{InMemoryStore, InMemoryVectorStore};
    use async_trait::async_trait;
    use serde_json::json;

    fn tools() -> MemoryTools {
        let store = Arc::new(InMemoryStore::new());
        let embedder = Arc::new(HashEmbeddingProvider::new(256));
        let vectors = Arc::new(InMemoryVectorStore::new(embedder));
        MemoryTools::new(store, vectors)
    }

    struct BrokenVectorStore;

    #[async_trait]
    impl VectorStore for BrokenVectorStore {
        async fn add_documents(&self, _documents: Vec<Document>) -> MemoirResult<Vec<String>> {
            Err(MemoirError::storage("add_documents", "connection refused"))
        }

        async fn similarity_search(
            &self,
            _query: &str,
            _k: usize,
            _filter: &MetadataFilter,
        ) -> MemoirResult<Vec<Document>> {
            Err(MemoirError::storage("similarity_search", "connection refused"))
        }
    }

    #[tokio::test]
    async fn test_saved_recall_is_searchable_with_timestamp() {
        let tools = tools();
        let ctx = ToolContext::for_user(UserId(1));

        let status = tools
            .save_recall_memory(&ctx, "likes espresso", Some("2024-01-01"))
            .await;
        assert_eq!(status, "Memory saved successfully");

        let hits = tools.search_memory(&ctx, "coffee preference", 5).await;
        assert_eq!(hits.len(), 1);
        assert!(hits[0].contains("likes espresso"));
        assert!(hits[0].contains("Timestamp:2024-01-01"));
    }

    #[tokio::test]
    async fn test_blank_timestamp_is_not_stored() {
        let tools = tools();
        let ctx = ToolContext::for_user(UserId(1));

        tools.save_recall_memory(&ctx, "likes espresso", Some("")).await;
        tools.save_recall_memory(&ctx, "plays chess", Some("   ")).await;

        let hits = tools.search_memory(&ctx, "espresso chess", 5).await;
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|hit| !hit.contains("Timestamp")), "{hits:?}");
    }

    #[tokio::test]
    async fn test_search_never_crosses_users() {
        let tools = tools();
        let alex = ToolContext::for_user(UserId(1));
        let sam = ToolContext::for_user(UserId(2));

        tools.save_recall_memory(&alex, "likes espresso", None).await;
        tools.save_recall_memory(&sam, "likes green tea", None).await;
        tools.save_recall_memory(&sam, "likes espresso too", None).await;

        let hits = tools.search_memory(&alex, "likes espresso", 10).await;
        assert_eq!(hits, vec!["likes espresso".to_string()]);
    }

    #[tokio::test]
    async fn test_store_core_memory_semantics() {
        let tools = tools();
        let ctx = ToolContext::for_user(UserId(1));

        assert_eq!(
            tools.store_core_memory(&ctx, "works at Acme", None).await,
            "Core memory stored successfully"
        );
        tools.store_core_memory(&ctx, "My name is Alex", None).await;
        tools.store_core_memory(&ctx, "works at Initech", Some(1)).await;
        tools.store_core_memory(&ctx, "lives in Oslo", Some(7)).await;

        assert_eq!(
            tools.core_facts(UserId(1)).await.unwrap(),
            vec!["lives in Oslo", "My name is Alex", "works at Initech"]
        );
    }

    #[tokio::test]
    async fn test_missing_identity_reports_failure() {
        let tools = tools();
        let anonymous = ToolContext::default();

        assert_eq!(
            tools.save_recall_memory(&anonymous, "likes espresso", None).await,
            "Failed to save memory"
        );
        assert_eq!(
            tools.store_core_memory(&anonymous, "My name is Alex", None).await,
            "Failed to store core memory"
        );
        assert!(tools.search_memory(&anonymous, "espresso", 5).await.is_empty());
    }

    #[tokio::test]
    async fn test_storage_failures_degrade_to_text() {
        let tools = MemoryTools::new(Arc::new(InMemoryStore::new()), Arc::new(BrokenVectorStore));
        let ctx = ToolContext::for_user(UserId(1));

        assert_eq!(
            tools.save_recall_memory(&ctx, "likes espresso", None).await,
            "Failed to save memory"
        );
        assert!(tools.search_memory(&ctx, "espresso", 5).await.is_empty());
        assert!(tools.recall(UserId(1), "espresso", 5).await.is_err());
    }

    #[tokio::test]
    async fn test_invoke_decodes_arguments() {
        let tools = tools();
        let ctx = ToolContext::for_user(UserId(1));

        let output = tools
            .invoke(
                MemoryTool::StoreCoreMemory,
                json!({"memory": "My name is Alex"}),
                &ctx,
            )
            .await
            .unwrap();
        assert_eq!(output.to_string(), "Core memory stored successfully");

        let output = tools
            .invoke(MemoryTool::SearchMemory, json!({"query": "name"}), &ctx)
            .await
            .unwrap();
        assert_eq!(output, ToolOutput::Memories(Vec::new()));
        assert_eq!(output.to_string(), "[]");

        let err = tools
            .invoke(MemoryTool::SaveRecallMemory, json!({"text": "oops"}), &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, MemoirError::Tool { ref tool, .. } if tool == "save_recall_memory"));
    }

    #[test]
    fn test_tool_lookup_and_definitions() {
        assert_eq!(MemoryTool::from_name("search_memory"), Some(MemoryTool::SearchMemory));
        assert_eq!(MemoryTool::from_name("delete_everything"), None);
        assert_eq!(
            MemoryTool::names(),
            vec!["save_recall_memory", "search_memory", "store_core_memory"]
        );

        let definition = MemoryTool::SearchMemory.definition();
        assert_eq!(definition.name, "search_memory");
        assert_eq!(definition.parameters["type"], "object");
        assert!(definition.parameters["properties"]["query"].is_object());
        assert_eq!(definition.parameters["required"], json!(["query"]));
        assert!(definition.parameters.get("title").is_none());
    }
}
