//! Neo4j graph store implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use neo4rs::{query, ConfigBuilder, Graph, Row};
use tracing::debug;
use uuid::Uuid;

use kontext_core::error::{KontextError, KontextResult};
use kontext_core::traits::{GraphStore, GraphStoreConfig};
use kontext_core::types::{Edge, EdgeRow, Entity, Episode};

const NEO4J_INDEXES: &[&str] = &[
    "CREATE INDEX entity_uuid IF NOT EXISTS FOR (e:Entity) ON (e.uuid)",
    "CREATE INDEX entity_group IF NOT EXISTS FOR (e:Entity) ON (e.groupId)",
    "CREATE INDEX entity_name IF NOT EXISTS FOR (e:Entity) ON (e.name)",
    "CREATE INDEX episode_uuid IF NOT EXISTS FOR (ep:Episode) ON (ep.uuid)",
    "CREATE INDEX episode_group IF NOT EXISTS FOR (ep:Episode) ON (ep.groupId)",
];

/// Neo4j graph store. Timestamps are stored as RFC 3339 strings so rows
/// stay portable across Neo4j-protocol servers.
pub struct Neo4jGraphStore {
    graph: Graph,
    #[allow(dead_code)]
    config: GraphStoreConfig,
}

impl Neo4jGraphStore {
    /// Connect to a Neo4j server and ensure lookup indexes exist.
    pub async fn new(config: GraphStoreConfig) -> KontextResult<Self> {
        Self::connect(config, "neo4j", NEO4J_INDEXES).await
    }

    pub(crate) async fn connect(
        config: GraphStoreConfig,
        default_user: &str,
        indexes: &[&str],
    ) -> KontextResult<Self> {
        let username = config
            .username
            .clone()
            .unwrap_or_else(|| default_user.to_string());
        let password = config.password.clone().unwrap_or_default();

        let graph = match config.database.as_deref() {
            Some(database) => {
                let neo4j_config = ConfigBuilder::default()
                    .uri(config.url.clone())
                    .user(username)
                    .password(password)
                    .db(database)
                    .build()
                    .map_err(|e| {
                        KontextError::store_with_source("Invalid graph store configuration", e)
                    })?;
                Graph::connect(neo4j_config).await
            }
            None => Graph::new(&config.url, &username, &password).await,
        }
        .map_err(|e| KontextError::store_with_source("Failed to connect to graph store", e))?;

        let store = Self { graph, config };
        store.ensure_indexes(indexes).await;
        Ok(store)
    }

    /// Best-effort index bootstrap. Failures are logged and ignored so the
    /// store also works against servers with a different index syntax.
    async fn ensure_indexes(&self, indexes: &[&str]) {
        for stmt in indexes {
            if let Err(e) = self.graph.run(query(stmt)).await {
                debug!(statement = stmt, error = %e, "index creation skipped");
            }
        }
    }

    fn row_to_edge(row: &Row) -> EdgeRow {
        EdgeRow {
            fact: row.get("fact").unwrap_or_default(),
            source_entity: row.get("sourceEntity").unwrap_or_default(),
            source_type: row.get("sourceType").unwrap_or_default(),
            target_entity: row.get("targetEntity").unwrap_or_default(),
            target_type: row.get("targetType").unwrap_or_default(),
            relation: row.get("relation").unwrap_or_default(),
            valid_at: parse_timestamp(row.get::<String>("validAt").unwrap_or_default()),
        }
    }

    async fn collect_edges(&self, q: neo4rs::Query) -> KontextResult<Vec<EdgeRow>> {
        let mut result = self
            .graph
            .execute(q)
            .await
            .map_err(|e| KontextError::store_with_source("Edge query failed", e))?;

        let mut rows = Vec::new();
        while let Some(row) = result
            .next()
            .await
            .map_err(|e| KontextError::store_with_source("Failed to fetch row", e))?
        {
            rows.push(Self::row_to_edge(&row));
        }
        Ok(rows)
    }
}

fn parse_timestamp(value: String) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&value)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

#[async_trait]
impl GraphStore for Neo4jGraphStore {
    async fn create_episode(&self, episode: &Episode) -> KontextResult<()> {
        let q = query(
            r#"
            CREATE (ep:Episode {
              uuid: $uuid,
              content: $content,
              source: $source,
              groupId: $groupId,
              validAt: $validAt,
              createdAt: $createdAt
            })
            "#,
        )
        .param("uuid", episode.uuid.to_string())
        .param("content", episode.content.clone())
        .param("source", episode.source.as_str())
        .param("groupId", episode.group_id.clone())
        .param("validAt", episode.valid_at.to_rfc3339())
        .param("createdAt", episode.created_at.to_rfc3339());

        self.graph
            .run(q)
            .await
            .map_err(|e| KontextError::store_with_source("Failed to create episode", e))
    }

    async fn upsert_entity(&self, entity: &Entity) -> KontextResult<Entity> {
        // MERGE on the identity key makes concurrent upserts converge on
        // one row; properties are only written on create.
        let q = query(
            r#"
            MERGE (e:Entity {name: $name, groupId: $groupId})
            ON CREATE SET e.uuid = $uuid,
                          e.type = $type,
                          e.summary = $summary,
                          e.createdAt = $createdAt,
                          e.updatedAt = $updatedAt
            RETURN e.uuid AS uuid, e.type AS type, e.summary AS summary,
                   e.createdAt AS createdAt, e.updatedAt AS updatedAt
            "#,
        )
        .param("name", entity.name.clone())
        .param("groupId", entity.group_id.clone())
        .param("uuid", entity.uuid.to_string())
        .param("type", entity.entity_type.clone())
        .param("summary", entity.summary.clone())
        .param("createdAt", entity.created_at.to_rfc3339())
        .param("updatedAt", entity.updated_at.to_rfc3339());

        let mut result = self
            .graph
            .execute(q)
            .await
            .map_err(|e| KontextError::store_with_source("Failed to upsert entity", e))?;

        let row = result
            .next()
            .await
            .map_err(|e| KontextError::store_with_source("Failed to fetch row", e))?
            .ok_or_else(|| KontextError::store("Entity upsert returned no row"))?;

        let uuid_str: String = row.get("uuid").unwrap_or_default();
        let uuid = Uuid::parse_str(&uuid_str)
            .map_err(|e| KontextError::store_with_source("Stored entity has invalid uuid", e))?;

        Ok(Entity {
            uuid,
            name: entity.name.clone(),
            entity_type: row.get("type").unwrap_or_default(),
            summary: row.get("summary").unwrap_or_default(),
            group_id: entity.group_id.clone(),
            embedding: None,
            created_at: parse_timestamp(row.get::<String>("createdAt").unwrap_or_default())
                .unwrap_or(entity.created_at),
            updated_at: parse_timestamp(row.get::<String>("updatedAt").unwrap_or_default())
                .unwrap_or(entity.updated_at),
        })
    }

    async fn link_episode(&self, episode_uuid: Uuid, entity_uuid: Uuid) -> KontextResult<()> {
        let q = query(
            r#"
            MATCH (ep:Episode {uuid: $episodeUuid})
            MATCH (e:Entity {uuid: $entityUuid})
            MERGE (ep)-[:MENTIONS]->(e)
            "#,
        )
        .param("episodeUuid", episode_uuid.to_string())
        .param("entityUuid", entity_uuid.to_string());

        self.graph
            .run(q)
            .await
            .map_err(|e| KontextError::store_with_source("Failed to link episode", e))
    }

    async fn create_edge(&self, edge: &Edge) -> KontextResult<()> {
        let q = query(
            r#"
            MATCH (source:Entity {uuid: $sourceUuid})
            MATCH (target:Entity {uuid: $targetUuid})
            CREATE (source)-[r:RELATES_TO {
              uuid: $uuid,
              name: $name,
              fact: $fact,
              groupId: $groupId,
              episodes: $episodes,
              validAt: $validAt,
              createdAt: $createdAt
            }]->(target)
            "#,
        )
        .param("sourceUuid", edge.source_uuid.to_string())
        .param("targetUuid", edge.target_uuid.to_string())
        .param("uuid", edge.uuid.to_string())
        .param("name", edge.name.clone())
        .param("fact", edge.fact.clone())
        .param("groupId", edge.group_id.clone())
        .param("episodes", edge.episodes.clone())
        .param(
            "validAt",
            edge.valid_at.map(|d| d.to_rfc3339()).unwrap_or_default(),
        )
        .param("createdAt", edge.created_at.to_rfc3339());

        self.graph
            .run(q)
            .await
            .map_err(|e| KontextError::store_with_source("Failed to create edge", e))
    }

    async fn merge_edge(&self, edge: &Edge) -> KontextResult<bool> {
        let q = query(
            r#"
            MATCH (source:Entity {uuid: $sourceUuid})-[r:RELATES_TO]->(target:Entity {uuid: $targetUuid})
            WHERE r.name = $name AND r.groupId = $groupId AND r.invalidAt IS NULL
            WITH r LIMIT 1
            SET r.episodes = r.episodes + $episodes,
                r.fact = $fact
            RETURN r.uuid AS uuid
            "#,
        )
        .param("sourceUuid", edge.source_uuid.to_string())
        .param("targetUuid", edge.target_uuid.to_string())
        .param("name", edge.name.clone())
        .param("groupId", edge.group_id.clone())
        .param("episodes", edge.episodes.clone())
        .param("fact", edge.fact.clone());

        let mut result = self
            .graph
            .execute(q)
            .await
            .map_err(|e| KontextError::store_with_source("Failed to merge edge", e))?;

        let matched = result
            .next()
            .await
            .map_err(|e| KontextError::store_with_source("Failed to fetch row", e))?
            .is_some();
        Ok(matched)
    }

    async fn recent_edges(&self, group_id: &str, limit: usize) -> KontextResult<Vec<EdgeRow>> {
        let q = query(
            r#"
            MATCH (source:Entity)-[r:RELATES_TO]->(target:Entity)
            WHERE r.groupId = $groupId
              AND r.invalidAt IS NULL
            RETURN
              r.fact AS fact,
              source.name AS sourceEntity,
              source.type AS sourceType,
              target.name AS targetEntity,
              target.type AS targetType,
              r.name AS relation,
              r.validAt AS validAt
            ORDER BY r.createdAt DESC
            LIMIT $limit
            "#,
        )
        .param("groupId", group_id.to_string())
        .param("limit", limit as i64);

        self.collect_edges(q).await
    }

    async fn search_edges(
        &self,
        query_str: &str,
        group_id: &str,
        limit: usize,
    ) -> KontextResult<Vec<EdgeRow>> {
        let q = query(
            r#"
            MATCH (source:Entity)-[r:RELATES_TO]->(target:Entity)
            WHERE r.groupId = $groupId
              AND r.invalidAt IS NULL
              AND (
                toLower(source.name) CONTAINS toLower($query)
                OR toLower(target.name) CONTAINS toLower($query)
                OR toLower(r.fact) CONTAINS toLower($query)
                OR toLower(r.name) CONTAINS toLower($query)
              )
            RETURN DISTINCT
              r.fact AS fact,
              source.name AS sourceEntity,
              source.type AS sourceType,
              target.name AS targetEntity,
              target.type AS targetType,
              r.name AS relation,
              r.validAt AS validAt
            LIMIT $limit
            "#,
        )
        .param("groupId", group_id.to_string())
        .param("query", query_str.to_string())
        .param("limit", limit as i64);

        self.collect_edges(q).await
    }

    async fn delete_group(&self, group_id: &str) -> KontextResult<()> {
        let q = query(
            r#"
            MATCH (n)
            WHERE n.groupId = $groupId
            DETACH DELETE n
            "#,
        )
        .param("groupId", group_id.to_string());

        self.graph
            .run(q)
            .await
            .map_err(|e| KontextError::store_with_source("Failed to delete group", e))
    }
}
