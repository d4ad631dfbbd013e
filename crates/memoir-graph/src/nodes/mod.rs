//! Nodes of the memory subgraph

mod agent;
mod tools;

pub use agent::MemoryAgentNode;
pub use tools::ToolDispatchNode;
