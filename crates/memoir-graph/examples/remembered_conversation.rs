//! # Remembered Conversation
//!
//! Runs three turns for one user against a live OpenAI-compatible endpoint.
//! The first turn shares a few facts, the last one asks for them back after
//! the history window would normally have forgotten them.
//!
//! Everything is kept in memory, so nothing survives the process.
//!
//! ```bash
//! OPENAI_API_KEY=sk-... cargo run -p memoir-graph --example remembered_conversation
//! ```

use memoir_graph::{ControllerConfig, MemorySubgraph, SubgraphConfig, TurnController};
use memoir_llm::{Client, ClientConfig};
use memoir_memory::{
    ClientEmbeddingProvider, InMemoryStore, InMemoryVectorStore, MemoryTools, UserStore,
};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_target(false).init();

    let api_key = std::env::var("OPENAI_API_KEY")?;
    let mut config = ClientConfig::new(api_key);
    if let Ok(base_url) = std::env::var("OPENAI_BASE_PROVIDER") {
        config = config.with_base_url(base_url);
    }
    let client = Client::new(config)?;

    let store = Arc::new(InMemoryStore::new());
    let recall = Arc::new(InMemoryVectorStore::new(Arc::new(
        ClientEmbeddingProvider::new(client.clone()),
    )));
    let tools = MemoryTools::new(store.clone(), recall.clone());

    let subgraph = Arc::new(MemorySubgraph::new(
        Arc::new(client),
        tools.clone(),
        SubgraphConfig::default(),
    ));
    // A window of one turn makes the last question depend on stored memories
    let controller = TurnController::new(
        store.clone(),
        tools.clone(),
        subgraph,
        ControllerConfig::default().with_history_window(2),
    );

    let user = store.get_or_create_user(42, Some("alex")).await?;

    for text in [
        "Hi! I'm Alex, I live in Lisbon and I'm allergic to peanuts.",
        "I had an espresso with oat milk this morning, it was great.",
        "What do you know about me, and what did I drink today?",
    ] {
        info!(%text, "User");
        let reply = controller.handle_turn(user.id, text).await;
        info!(outcome = ?reply.outcome, answer = %reply.answer, "Assistant");
    }

    info!(core = ?tools.core_facts(user.id).await?, recall_facts = recall.len(), "Stored memories");
    Ok(())
}
