//! kontext-graph - Graph store implementations for kontext.
//!
//! This crate provides the persistence backends used by the kontext
//! memory layer.
//!
//! # Supported Providers
//!
//! - **Embedded** (feature: `embedded`, default) - In-process store, no
//!   external service
//! - **Neo4j** (feature: `neo4j`) - Neo4j over the bolt protocol
//! - **Memgraph** (feature: `memgraph`) - Memgraph over the bolt protocol

#[cfg(feature = "embedded")]
mod embedded;
mod factory;
#[cfg(feature = "memgraph")]
mod memgraph;
#[cfg(any(feature = "neo4j", feature = "memgraph"))]
mod neo4j;

#[cfg(feature = "embedded")]
pub use embedded::EmbeddedGraphStore;
pub use factory::GraphStoreFactory;
#[cfg(feature = "memgraph")]
pub use memgraph::MemgraphStore;
#[cfg(feature = "neo4j")]
pub use neo4j::Neo4jGraphStore;

// Re-export core types for convenience
pub use kontext_core::traits::{GraphStore, GraphStoreConfig, GraphStoreProvider};
