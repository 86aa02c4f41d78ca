//! Graph store trait and related configuration.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::KontextResult;
use crate::types::{Edge, EdgeRow, Entity, Episode};

/// Persistence contract consumed by the add and search pipelines.
///
/// Implementations must make `upsert_entity` atomic: two concurrent upserts
/// of the same (name, group_id) pair resolve to one row.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Persist an episode. Episodes are write-once.
    async fn create_episode(&self, episode: &Episode) -> KontextResult<()>;

    /// Atomically fetch-or-create an entity keyed on exact case-sensitive
    /// (name, group_id). When the entity already exists, the stored row is
    /// returned unchanged; the candidate's type is ignored.
    async fn upsert_entity(&self, entity: &Entity) -> KontextResult<Entity>;

    /// Create a MENTIONS link from an episode to an entity. Idempotent.
    async fn link_episode(&self, episode_uuid: Uuid, entity_uuid: Uuid) -> KontextResult<()>;

    /// Create a new edge row. No deduplication against existing edges.
    async fn create_edge(&self, edge: &Edge) -> KontextResult<()>;

    /// Fold the edge into an existing live edge with the same
    /// (source, relation label, target) triple, appending episode provenance
    /// and refreshing the fact. Returns false when no live triple matched.
    async fn merge_edge(&self, edge: &Edge) -> KontextResult<bool>;

    /// Fetch up to `limit` non-invalidated edges for a group, newest
    /// `created_at` first.
    async fn recent_edges(&self, group_id: &str, limit: usize) -> KontextResult<Vec<EdgeRow>>;

    /// Case-insensitive substring match of `query` against source name,
    /// target name, fact text, or relation label.
    async fn search_edges(
        &self,
        query: &str,
        group_id: &str,
        limit: usize,
    ) -> KontextResult<Vec<EdgeRow>>;

    /// Detach and delete every record carrying the group key.
    async fn delete_group(&self, group_id: &str) -> KontextResult<()>;
}

/// Graph store provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GraphStoreProvider {
    /// In-process store, no external service.
    #[default]
    Embedded,
    Neo4j,
    Memgraph,
}

/// Graph store connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphStoreConfig {
    pub provider: GraphStoreProvider,
    /// Connection URL (bolt). Ignored by the embedded store.
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Database name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
}

impl Default for GraphStoreConfig {
    fn default() -> Self {
        Self {
            provider: GraphStoreProvider::Embedded,
            url: "bolt://localhost:7687".to_string(),
            username: None,
            password: None,
            database: None,
        }
    }
}
