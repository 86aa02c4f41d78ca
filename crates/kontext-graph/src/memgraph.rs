//! Memgraph graph store implementation.
//! Memgraph speaks the Neo4j protocol; only connection defaults and the
//! index syntax differ.

use async_trait::async_trait;
use uuid::Uuid;

use kontext_core::error::KontextResult;
use kontext_core::traits::{GraphStore, GraphStoreConfig};
use kontext_core::types::{Edge, EdgeRow, Entity, Episode};

use crate::neo4j::Neo4jGraphStore;

const MEMGRAPH_INDEXES: &[&str] = &[
    "CREATE INDEX ON :Entity(uuid)",
    "CREATE INDEX ON :Entity(groupId)",
    "CREATE INDEX ON :Entity(name)",
    "CREATE INDEX ON :Episode(uuid)",
    "CREATE INDEX ON :Episode(groupId)",
];

/// Memgraph graph store.
pub struct MemgraphStore {
    inner: Neo4jGraphStore,
}

impl MemgraphStore {
    /// Connect to a Memgraph server.
    pub async fn new(config: GraphStoreConfig) -> KontextResult<Self> {
        let inner = Neo4jGraphStore::connect(config, "memgraph", MEMGRAPH_INDEXES).await?;
        Ok(Self { inner })
    }
}

#[async_trait]
impl GraphStore for MemgraphStore {
    async fn create_episode(&self, episode: &Episode) -> KontextResult<()> {
        self.inner.create_episode(episode).await
    }

    async fn upsert_entity(&self, entity: &Entity) -> KontextResult<Entity> {
        self.inner.upsert_entity(entity).await
    }

    async fn link_episode(&self, episode_uuid: Uuid, entity_uuid: Uuid) -> KontextResult<()> {
        self.inner.link_episode(episode_uuid, entity_uuid).await
    }

    async fn create_edge(&self, edge: &Edge) -> KontextResult<()> {
        self.inner.create_edge(edge).await
    }

    async fn merge_edge(&self, edge: &Edge) -> KontextResult<bool> {
        self.inner.merge_edge(edge).await
    }

    async fn recent_edges(&self, group_id: &str, limit: usize) -> KontextResult<Vec<EdgeRow>> {
        self.inner.recent_edges(group_id, limit).await
    }

    async fn search_edges(
        &self,
        query: &str,
        group_id: &str,
        limit: usize,
    ) -> KontextResult<Vec<EdgeRow>> {
        self.inner.search_edges(query, group_id, limit).await
    }

    async fn delete_group(&self, group_id: &str) -> KontextResult<()> {
        self.inner.delete_group(group_id).await
    }
}
