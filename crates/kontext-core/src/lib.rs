//! kontext-core - Core library for kontext.
//!
//! This crate provides the types, traits, configuration, and memory
//! pipelines for the kontext graph-backed memory layer for AI agents.
//! Provider implementations live in `kontext-llm` and `kontext-graph`;
//! the public facade lives in the `kontext` crate.

pub mod config;
pub mod error;
pub mod memory;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use config::{EdgePolicy, KontextConfig, MemoryOptions};
pub use error::{KontextError, KontextResult};
pub use memory::{ContextBuilder, MemoryAdder, MemorySearcher};
pub use traits::{
    EmbedderConfig, EmbedderProvider, GraphStore, GraphStoreConfig, GraphStoreProvider, LlmClient,
    LlmConfig, LlmProvider, LlmProviderConfig,
};
pub use types::{
    AddOptions, AddOutcome, Edge, EdgeRow, Entity, EntitySummary, Episode, EpisodeSource,
    EpisodeSummary, GroupScope, Message, MessageInput, MessageRole, Relation, SearchMode,
    SearchOptions, SearchResult,
};
