#![allow(dead_code)]

use async_trait::async_trait;
use memoir_graph::{ControllerConfig, MemorySubgraph, SubgraphConfig, TurnController};
use memoir_llm::{
    ChatMessage, ChatModel, ChatResponse, LlmError, LlmResult, ToolCall, ToolDefinition,
};
use memoir_memory::{
    ConversationTurn, HashEmbeddingProvider, InMemoryStore, InMemoryVectorStore, MemoirError,
    MemoirResult, MemoryTools, TranscriptStore, UserId,
};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

type Script = Box<dyn Fn(usize) -> LlmResult<ChatResponse> + Send + Sync>;

/// A chat model that answers from a script and records every request
pub struct ScriptedModel {
    script: Script,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
    delay: Option<(usize, Duration)>,
}

impl ScriptedModel {
    /// Answer call `n` with `script(n)`
    pub fn from_fn(
        script: impl Fn(usize) -> LlmResult<ChatResponse> + Send + Sync + 'static,
    ) -> Self {
        Self {
            script: Box::new(script),
            requests: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// Answer with `responses` in order; calls past the end fail
    pub fn new(responses: Vec<ChatResponse>) -> Self {
        Self::from_fn(move |n| {
            responses
                .get(n)
                .cloned()
                .ok_or_else(|| LlmError::invalid_response("script exhausted"))
        })
    }

    /// Every call fails like an unavailable API
    pub fn failing() -> Self {
        Self::from_fn(|_| {
            Err(LlmError::Api {
                status: 503,
                message: "service unavailable".to_string(),
            })
        })
    }

    /// Sleep before answering calls with index `from_call` and later
    pub fn with_delay_from(mut self, from_call: usize, delay: Duration) -> Self {
        self.delay = Some((from_call, delay));
        self
    }

    /// Messages sent on every call so far
    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().clone()
    }

    /// Number of calls so far
    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn chat_completion_with_tools(
        &self,
        messages: Vec<ChatMessage>,
        _tools: Vec<ToolDefinition>,
    ) -> LlmResult<ChatResponse> {
        let call = {
            let mut requests = self.requests.lock();
            requests.push(messages);
            requests.len() - 1
        };

        if let Some((from_call, delay)) = self.delay {
            if call >= from_call {
                tokio::time::sleep(delay).await;
            }
        }

        (self.script)(call)
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// Assistant reply requesting one tool call
pub fn tool_call(id: &str, name: &str, arguments: Value) -> ChatResponse {
    ChatResponse::with_tool_calls("", vec![ToolCall::new(id, name, arguments)])
}

/// Transcript store that can be told to fail reads or writes
pub struct FlakyTranscripts {
    inner: InMemoryStore,
    fail_reads: bool,
    fail_writes: bool,
}

impl FlakyTranscripts {
    pub fn failing_reads() -> Self {
        Self {
            inner: InMemoryStore::new(),
            fail_reads: true,
            fail_writes: false,
        }
    }

    pub fn failing_writes() -> Self {
        Self {
            inner: InMemoryStore::new(),
            fail_reads: false,
            fail_writes: true,
        }
    }
}

#[async_trait]
impl TranscriptStore for FlakyTranscripts {
    async fn recent_turns(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> MemoirResult<Vec<ConversationTurn>> {
        if self.fail_reads {
            return Err(MemoirError::storage("recent_turns", "database is locked"));
        }
        self.inner.recent_turns(user_id, limit).await
    }

    async fn append_turns(
        &self,
        user_id: UserId,
        turns: Vec<ConversationTurn>,
    ) -> MemoirResult<usize> {
        if self.fail_writes {
            return Err(MemoirError::storage("append_turns", "disk full"));
        }
        self.inner.append_turns(user_id, turns).await
    }

    async fn transcript(&self, user_id: UserId) -> MemoirResult<Vec<ConversationTurn>> {
        self.inner.transcript(user_id).await
    }
}

/// A controller over in-memory stores and a scripted model
pub struct Harness {
    pub store: Arc<InMemoryStore>,
    pub tools: MemoryTools,
    pub model: Arc<ScriptedModel>,
    pub controller: Arc<TurnController>,
}

impl Harness {
    pub fn new(model: ScriptedModel) -> Self {
        Self::build(model, None, ControllerConfig::default(), SubgraphConfig::default())
    }

    pub fn build(
        model: ScriptedModel,
        transcripts: Option<Arc<dyn TranscriptStore>>,
        controller_config: ControllerConfig,
        subgraph_config: SubgraphConfig,
    ) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let vectors = Arc::new(InMemoryVectorStore::new(Arc::new(HashEmbeddingProvider::new(128))));
        let tools = MemoryTools::new(store.clone(), vectors);
        let model = Arc::new(model);

        let subgraph = Arc::new(MemorySubgraph::new(model.clone(), tools.clone(), subgraph_config));
        let transcripts =
            transcripts.unwrap_or_else(|| store.clone() as Arc<dyn TranscriptStore>);
        let controller = Arc::new(TurnController::new(
            transcripts,
            tools.clone(),
            subgraph,
            controller_config,
        ));

        Self {
            store,
            tools,
            model,
            controller,
        }
    }
}
