use crate::config::Settings;
use anyhow::{Context, Result};
use memoir_graph::{
    ControllerConfig, MemorySubgraph, MessageHandler, SubgraphConfig, TurnController,
};
use memoir_llm::{Client, ClientConfig};
use memoir_memory::{ClientEmbeddingProvider, MemoryTools, SqliteStore, SqliteVectorStore};
use std::sync::Arc;
use tracing::info;

/// Long-lived resources, built once at startup and closed on shutdown
pub struct App {
    conversations: Arc<SqliteStore>,
    recall: Arc<SqliteVectorStore>,
    handler: Arc<MessageHandler>,
}

impl App {
    pub async fn initialize(settings: &Settings) -> Result<Self> {
        let client = Client::new(
            ClientConfig::new(&settings.openai_api_key)
                .with_base_url(&settings.openai_base_provider)
                .with_model(&settings.openai_model)
                .with_embedding_model(
                    &settings.openai_embedding_model,
                    Some(settings.embedding_dimensions),
                ),
        )
        .context("failed to build LLM client")?;

        let conversations = Arc::new(
            SqliteStore::connect(&settings.database_url)
                .await
                .context("failed to open conversation store")?,
        );

        let embedder = Arc::new(ClientEmbeddingProvider::new(client.clone()));
        let recall = Arc::new(
            SqliteVectorStore::connect(&settings.pgvector_url, embedder)
                .await
                .context("failed to open recall store")?,
        );

        let tools = MemoryTools::new(conversations.clone(), recall.clone());
        let subgraph = Arc::new(MemorySubgraph::new(
            Arc::new(client),
            tools.clone(),
            SubgraphConfig::default().with_max_iterations(settings.max_iterations),
        ));
        let controller = Arc::new(TurnController::new(
            conversations.clone(),
            tools,
            subgraph,
            ControllerConfig::default().with_turn_timeout(settings.turn_timeout()),
        ));
        let handler = Arc::new(MessageHandler::new(conversations.clone(), controller));

        info!(
            model = %settings.openai_model,
            embedding_model = %settings.openai_embedding_model,
            "Memoir initialized"
        );

        Ok(Self {
            conversations,
            recall,
            handler,
        })
    }

    pub fn handler(&self) -> Arc<MessageHandler> {
        self.handler.clone()
    }

    pub async fn shutdown(self) {
        self.conversations.close().await;
        self.recall.close().await;
        info!("Memoir shut down");
    }
}
