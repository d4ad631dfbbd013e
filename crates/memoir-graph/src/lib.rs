//! # Memoir Graph
//!
//! The memory-augmented conversation controller.
//!
//! ## Components
//!
//! - [`TurnState`]: ephemeral working data of one turn
//! - [`MemoryAgentNode`]: prompts the model with core and recall memories and
//!   the memory tools bound
//! - [`ToolDispatchNode`]: executes requested tool calls and feeds the
//!   observations back
//! - [`MemorySubgraph`]: the bounded `memory_agent -> tools -> memory_agent` loop
//! - [`TurnController`]: loads context, runs the subgraph, persists the exchange
//! - [`MessageHandler`]: resolves platform users and hands messages to the controller
//!
//! ## Example
//!
//! ```rust,no_run
//! use memoir_graph::{
//!     ControllerConfig, InboundMessage, MemorySubgraph, MessageHandler, SubgraphConfig,
//!     TurnController,
//! };
//! use memoir_llm::{Client, ClientConfig};
//! use memoir_memory::{HashEmbeddingProvider, InMemoryStore, InMemoryVectorStore, MemoryTools};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let model = Arc::new(Client::new(ClientConfig::new("sk-..."))?);
//! let store = Arc::new(InMemoryStore::new());
//! let vectors = Arc::new(InMemoryVectorStore::new(Arc::new(HashEmbeddingProvider::new(256))));
//! let tools = MemoryTools::new(store.clone(), vectors);
//!
//! let subgraph = Arc::new(MemorySubgraph::new(model, tools.clone(), SubgraphConfig::default()));
//! let controller = Arc::new(TurnController::new(
//!     store.clone(),
//!     tools,
//!     subgraph,
//!     ControllerConfig::default(),
//! ));
//! let handler = MessageHandler::new(store, controller);
//!
//! let answer = handler
//!     .handle(InboundMessage::new(1001, Some("alex".into()), "My name is Alex"))
//!     .await;
//! println!("{answer}");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod controller;
pub mod core;
pub mod inbound;
pub mod nodes;
pub mod prompt;
pub mod state;
pub mod subgraph;

pub use config::{ControllerConfig, SubgraphConfig};
pub use controller::{TurnController, TurnOutcome, TurnReply};
pub use crate::core::{ExecutionContext, ExecutionResult, Node, NodeId};
pub use inbound::{InboundMessage, MessageHandler};
pub use nodes::{MemoryAgentNode, ToolDispatchNode};
pub use prompt::{system_prompt, DEFAULT_PREAMBLE};
pub use state::TurnState;
pub use subgraph::{route_tools, MemorySubgraph, Step, SubgraphOutcome, MEMORY_SUBGRAPH_ID};
