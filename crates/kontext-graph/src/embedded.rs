//! In-process graph store. No external service required.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use kontext_core::error::KontextResult;
use kontext_core::traits::GraphStore;
use kontext_core::types::{Edge, EdgeRow, Entity, Episode};

#[derive(Default)]
struct GraphData {
    episodes: HashMap<Uuid, Episode>,
    entities: HashMap<Uuid, Entity>,
    edges: Vec<Edge>,
    mentions: HashSet<(Uuid, Uuid)>,
}

impl GraphData {
    fn edge_to_row(&self, edge: &Edge) -> EdgeRow {
        let (source_entity, source_type) = self.entity_display(edge.source_uuid);
        let (target_entity, target_type) = self.entity_display(edge.target_uuid);
        EdgeRow {
            fact: edge.fact.clone(),
            source_entity,
            source_type,
            target_entity,
            target_type,
            relation: edge.name.clone(),
            valid_at: edge.valid_at,
        }
    }

    fn entity_display(&self, uuid: Uuid) -> (String, String) {
        match self.entities.get(&uuid) {
            Some(e) => (e.name.clone(), e.entity_type.clone()),
            None => (String::new(), String::new()),
        }
    }
}

/// In-memory graph store backed by a single `RwLock`. The whole graph
/// lives in process memory; the write lock makes entity upserts atomic.
#[derive(Default)]
pub struct EmbeddedGraphStore {
    data: RwLock<GraphData>,
}

impl EmbeddedGraphStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GraphStore for EmbeddedGraphStore {
    async fn create_episode(&self, episode: &Episode) -> KontextResult<()> {
        let mut data = self.data.write().await;
        data.episodes.insert(episode.uuid, episode.clone());
        Ok(())
    }

    async fn upsert_entity(&self, entity: &Entity) -> KontextResult<Entity> {
        let mut data = self.data.write().await;
        // Find-or-insert under one write lock, keyed on exact (name, groupId).
        if let Some(existing) = data
            .entities
            .values()
            .find(|e| e.name == entity.name && e.group_id == entity.group_id)
        {
            return Ok(existing.clone());
        }
        data.entities.insert(entity.uuid, entity.clone());
        Ok(entity.clone())
    }

    async fn link_episode(&self, episode_uuid: Uuid, entity_uuid: Uuid) -> KontextResult<()> {
        let mut data = self.data.write().await;
        data.mentions.insert((episode_uuid, entity_uuid));
        Ok(())
    }

    async fn create_edge(&self, edge: &Edge) -> KontextResult<()> {
        let mut data = self.data.write().await;
        data.edges.push(edge.clone());
        Ok(())
    }

    async fn merge_edge(&self, edge: &Edge) -> KontextResult<bool> {
        let mut data = self.data.write().await;
        let existing = data.edges.iter_mut().find(|e| {
            e.source_uuid == edge.source_uuid
                && e.target_uuid == edge.target_uuid
                && e.name == edge.name
                && e.group_id == edge.group_id
                && e.invalid_at.is_none()
        });
        match existing {
            Some(existing) => {
                existing.episodes.extend(edge.episodes.iter().cloned());
                existing.fact = edge.fact.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn recent_edges(&self, group_id: &str, limit: usize) -> KontextResult<Vec<EdgeRow>> {
        let data = self.data.read().await;
        let mut edges: Vec<&Edge> = data
            .edges
            .iter()
            .filter(|e| e.group_id == group_id && e.invalid_at.is_none())
            .collect();
        edges.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(edges
            .into_iter()
            .take(limit)
            .map(|e| data.edge_to_row(e))
            .collect())
    }

    async fn search_edges(
        &self,
        query: &str,
        group_id: &str,
        limit: usize,
    ) -> KontextResult<Vec<EdgeRow>> {
        let needle = query.to_lowercase();
        let data = self.data.read().await;
        Ok(data
            .edges
            .iter()
            .filter(|e| e.group_id == group_id && e.invalid_at.is_none())
            .map(|e| data.edge_to_row(e))
            .filter(|row| {
                row.source_entity.to_lowercase().contains(&needle)
                    || row.target_entity.to_lowercase().contains(&needle)
                    || row.fact.to_lowercase().contains(&needle)
                    || row.relation.to_lowercase().contains(&needle)
            })
            .take(limit)
            .collect())
    }

    async fn delete_group(&self, group_id: &str) -> KontextResult<()> {
        let mut data = self.data.write().await;
        let dead_episodes: HashSet<Uuid> = data
            .episodes
            .values()
            .filter(|e| e.group_id == group_id)
            .map(|e| e.uuid)
            .collect();
        let dead_entities: HashSet<Uuid> = data
            .entities
            .values()
            .filter(|e| e.group_id == group_id)
            .map(|e| e.uuid)
            .collect();
        data.episodes.retain(|_, e| e.group_id != group_id);
        data.entities.retain(|_, e| e.group_id != group_id);
        data.edges.retain(|e| e.group_id != group_id);
        data.mentions
            .retain(|(ep, en)| !dead_episodes.contains(ep) && !dead_entities.contains(en));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entity(name: &str, group: &str) -> Entity {
        Entity::new(name, "Person", group)
    }

    #[tokio::test]
    async fn test_upsert_returns_existing_row() {
        let store = EmbeddedGraphStore::new();
        let first = store.upsert_entity(&entity("Alice", "g1")).await.unwrap();

        let mut candidate = entity("Alice", "g1");
        candidate.entity_type = "Organization".to_string();
        let second = store.upsert_entity(&candidate).await.unwrap();

        assert_eq!(first.uuid, second.uuid);
        assert_eq!(second.entity_type, "Person");
    }

    #[tokio::test]
    async fn test_upsert_is_case_and_group_sensitive() {
        let store = EmbeddedGraphStore::new();
        let a = store.upsert_entity(&entity("Alice", "g1")).await.unwrap();
        let b = store.upsert_entity(&entity("alice", "g1")).await.unwrap();
        let c = store.upsert_entity(&entity("Alice", "g2")).await.unwrap();

        assert_ne!(a.uuid, b.uuid);
        assert_ne!(a.uuid, c.uuid);
    }

    #[tokio::test]
    async fn test_recent_edges_newest_first_with_limit() {
        let store = EmbeddedGraphStore::new();
        let alice = store.upsert_entity(&entity("Alice", "g1")).await.unwrap();
        let acme = store
            .upsert_entity(&Entity::new("Acme", "Organization", "g1"))
            .await
            .unwrap();

        let episode = Uuid::new_v4();
        for (i, fact) in ["first", "second", "third"].iter().enumerate() {
            let mut edge = Edge::new(
                alice.uuid,
                acme.uuid,
                "WORKS_AT",
                *fact,
                "g1",
                episode,
                Utc::now(),
            );
            edge.created_at = Utc::now() + chrono::Duration::seconds(i as i64);
            store.create_edge(&edge).await.unwrap();
        }

        let rows = store.recent_edges("g1", 1).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].fact, "third");
        assert_eq!(rows[0].source_entity, "Alice");
        assert_eq!(rows[0].target_type, "Organization");
    }

    #[tokio::test]
    async fn test_merge_edge_appends_provenance() {
        let store = EmbeddedGraphStore::new();
        let alice = store.upsert_entity(&entity("Alice", "g1")).await.unwrap();
        let acme = store
            .upsert_entity(&Entity::new("Acme", "Organization", "g1"))
            .await
            .unwrap();

        let ep1 = Uuid::new_v4();
        let edge = Edge::new(alice.uuid, acme.uuid, "WORKS_AT", "old", "g1", ep1, Utc::now());
        store.create_edge(&edge).await.unwrap();

        let ep2 = Uuid::new_v4();
        let update = Edge::new(alice.uuid, acme.uuid, "WORKS_AT", "new", "g1", ep2, Utc::now());
        assert!(store.merge_edge(&update).await.unwrap());

        let rows = store.recent_edges("g1", 10).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].fact, "new");

        // No live triple for a different relation label.
        let other = Edge::new(alice.uuid, acme.uuid, "FOUNDED", "x", "g1", ep2, Utc::now());
        assert!(!store.merge_edge(&other).await.unwrap());
    }

    #[tokio::test]
    async fn test_search_matches_all_four_fields() {
        let store = EmbeddedGraphStore::new();
        let alice = store.upsert_entity(&entity("Alice", "g1")).await.unwrap();
        let acme = store
            .upsert_entity(&Entity::new("Acme", "Organization", "g1"))
            .await
            .unwrap();
        let edge = Edge::new(
            alice.uuid,
            acme.uuid,
            "WORKS_AT",
            "Alice works at Acme.",
            "g1",
            Uuid::new_v4(),
            Utc::now(),
        );
        store.create_edge(&edge).await.unwrap();

        for query in ["alice", "ACME", "works at", "works_at"] {
            let rows = store.search_edges(query, "g1", 10).await.unwrap();
            assert_eq!(rows.len(), 1, "query {:?} should match", query);
        }
        assert!(store.search_edges("zeppelin", "g1", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_group_is_scoped() {
        let store = EmbeddedGraphStore::new();
        let alice = store.upsert_entity(&entity("Alice", "g1")).await.unwrap();
        let bob = store.upsert_entity(&entity("Bob", "g2")).await.unwrap();
        let edge = Edge::new(
            alice.uuid,
            alice.uuid,
            "KNOWS",
            "fact",
            "g1",
            Uuid::new_v4(),
            Utc::now(),
        );
        store.create_edge(&edge).await.unwrap();
        let other = Edge::new(
            bob.uuid,
            bob.uuid,
            "KNOWS",
            "fact",
            "g2",
            Uuid::new_v4(),
            Utc::now(),
        );
        store.create_edge(&other).await.unwrap();

        store.delete_group("g1").await.unwrap();

        assert!(store.recent_edges("g1", 10).await.unwrap().is_empty());
        assert_eq!(store.recent_edges("g2", 10).await.unwrap().len(), 1);
    }
}
