//! Factory for creating graph stores.

use std::sync::Arc;

use kontext_core::error::KontextResult;
use kontext_core::traits::{GraphStore, GraphStoreConfig, GraphStoreProvider};

#[cfg(feature = "embedded")]
use crate::embedded::EmbeddedGraphStore;
#[cfg(feature = "memgraph")]
use crate::memgraph::MemgraphStore;
#[cfg(feature = "neo4j")]
use crate::neo4j::Neo4jGraphStore;

/// Factory for creating graph stores.
pub struct GraphStoreFactory;

impl GraphStoreFactory {
    /// Create a graph store from the given configuration. Server-backed
    /// providers connect eagerly and bootstrap their indexes here.
    pub async fn create(config: &GraphStoreConfig) -> KontextResult<Arc<dyn GraphStore>> {
        match config.provider {
            #[cfg(feature = "embedded")]
            GraphStoreProvider::Embedded => Ok(Arc::new(EmbeddedGraphStore::new())),
            #[cfg(not(feature = "embedded"))]
            GraphStoreProvider::Embedded => Err(kontext_core::error::KontextError::config(
                "Embedded graph store not available. Enable the 'embedded' feature.",
            )),
            #[cfg(feature = "neo4j")]
            GraphStoreProvider::Neo4j => {
                Ok(Arc::new(Neo4jGraphStore::new(config.clone()).await?))
            }
            #[cfg(not(feature = "neo4j"))]
            GraphStoreProvider::Neo4j => Err(kontext_core::error::KontextError::config(
                "Neo4j support not available. Enable the 'neo4j' feature.",
            )),
            #[cfg(feature = "memgraph")]
            GraphStoreProvider::Memgraph => {
                Ok(Arc::new(MemgraphStore::new(config.clone()).await?))
            }
            #[cfg(not(feature = "memgraph"))]
            GraphStoreProvider::Memgraph => Err(kontext_core::error::KontextError::config(
                "Memgraph support not available. Enable the 'memgraph' feature.",
            )),
        }
    }
}

#[cfg(all(test, feature = "embedded"))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_config_yields_embedded_store() {
        let store = GraphStoreFactory::create(&GraphStoreConfig::default())
            .await
            .unwrap();
        store.delete_group("g1").await.unwrap();
    }
}
