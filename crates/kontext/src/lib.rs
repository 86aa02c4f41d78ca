//! kontext - Graph-backed memory layer for AI agents.
//!
//! kontext turns conversations into a knowledge graph: entities and
//! relations are extracted with an LLM, persisted to a graph store, and
//! retrieved as prompt-ready context.
//!
//! # Example
//!
//! ```ignore
//! use kontext::{AddOptions, Kontext, KontextConfig, SearchOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let kontext = Kontext::new(KontextConfig::default())?;
//!
//!     kontext
//!         .add("My name is Alice and I work at Acme.", AddOptions::for_user("alice"))
//!         .await?;
//!
//!     let context = kontext
//!         .get_context("Where does Alice work?", SearchOptions::for_user("alice"))
//!         .await?;
//!     println!("{context}");
//!     Ok(())
//! }
//! ```

mod client;

pub use client::{AddReceipt, AddTask, Kontext};

// Re-export the public surface of the member crates
pub use kontext_core::config::{EdgePolicy, KontextConfig, KontextConfigBuilder, MemoryOptions};
pub use kontext_core::error::{KontextError, KontextResult};
pub use kontext_core::memory::{format_context, NO_CONTEXT_SENTINEL};
pub use kontext_core::traits::{
    EmbedderConfig, EmbedderProvider, GraphStore, GraphStoreConfig, GraphStoreProvider, LlmClient,
    LlmConfig, LlmProvider, LlmProviderConfig,
};
pub use kontext_core::types::{
    AddOptions, AddOutcome, Entity, EntitySummary, Episode, GroupScope, Message, MessageInput,
    MessageRole, Relation, SearchMode, SearchOptions, SearchResult,
};
pub use kontext_graph::GraphStoreFactory;
pub use kontext_llm::LlmClientFactory;
