//! Memory add pipeline: episode → entities → relations → edges.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::warn;

use crate::config::EdgePolicy;
use crate::error::KontextResult;
use crate::traits::{GraphStore, LlmClient};
use crate::types::{AddOptions, AddOutcome, Edge, Entity, Episode, Message};

use super::json_parser::{parse_extracted_entities, parse_extracted_relations};
use super::prompts::{
    build_entity_extraction_messages, build_relation_extraction_messages, ExtractedEntity,
    ExtractedRelation,
};
use crate::types::format_messages;

/// Orchestrates one add call. Extraction failures degrade to empty lists and
/// per-record persistence failures are skipped, so a partially stored add
/// still succeeds; the episode itself is persisted before extraction starts.
pub struct MemoryAdder {
    store: Arc<dyn GraphStore>,
    llm: Arc<dyn LlmClient>,
    edge_policy: EdgePolicy,
}

impl MemoryAdder {
    /// Create an adder over the given store and model client.
    pub fn new(
        store: Arc<dyn GraphStore>,
        llm: Arc<dyn LlmClient>,
        edge_policy: EdgePolicy,
    ) -> Self {
        Self {
            store,
            llm,
            edge_policy,
        }
    }

    /// Run the full pipeline and return the records actually stored.
    pub async fn add(&self, messages: &[Message], options: &AddOptions) -> KontextResult<AddOutcome> {
        let group_id = options.scope.group_id()?.to_string();
        let content = format_messages(messages);
        let valid_at = options.valid_at.unwrap_or_else(Utc::now);

        // Persist the episode first so the raw content survives extraction
        // failures.
        let episode = Episode::new(content.clone(), group_id.clone(), valid_at);
        self.store.create_episode(&episode).await?;

        let extracted = self.extract_entities(&content, &group_id).await;
        let entities = self.store_entities(&extracted, &group_id, &episode).await;

        let relations = self.extract_relations(&content, &extracted).await;
        let edges = self
            .store_edges(&relations, &entities, &group_id, &episode, valid_at)
            .await;

        Ok(AddOutcome {
            episode,
            entities,
            edges,
        })
    }

    async fn extract_entities(&self, content: &str, group_id: &str) -> Vec<ExtractedEntity> {
        let messages = build_entity_extraction_messages(content, group_id);
        let result = match self.llm.generate_json(&messages).await {
            Ok(value) => parse_extracted_entities(&value),
            Err(e) => Err(e),
        };
        match result {
            Ok(entities) => entities,
            Err(e) => {
                warn!(error = %e, "entity extraction failed, continuing with none");
                Vec::new()
            }
        }
    }

    async fn extract_relations(
        &self,
        content: &str,
        entities: &[ExtractedEntity],
    ) -> Vec<ExtractedRelation> {
        // A relation needs two endpoints.
        if entities.len() < 2 {
            return Vec::new();
        }
        let messages = build_relation_extraction_messages(content, entities);
        let result = match self.llm.generate_json(&messages).await {
            Ok(value) => parse_extracted_relations(&value),
            Err(e) => Err(e),
        };
        match result {
            Ok(relations) => relations,
            Err(e) => {
                warn!(error = %e, "relation extraction failed, continuing with none");
                Vec::new()
            }
        }
    }

    /// Resolve each extracted entity to a stored row (atomic fetch-or-create
    /// on the exact (name, group) pair) and link it to the episode.
    async fn store_entities(
        &self,
        extracted: &[ExtractedEntity],
        group_id: &str,
        episode: &Episode,
    ) -> Vec<Entity> {
        let mut entities = Vec::with_capacity(extracted.len());
        for candidate in extracted {
            let entity = Entity::new(&candidate.name, &candidate.entity_type, group_id);
            let resolved = match self.store.upsert_entity(&entity).await {
                Ok(resolved) => resolved,
                Err(e) => {
                    warn!(name = %candidate.name, error = %e, "entity upsert failed, skipping");
                    continue;
                }
            };
            if let Err(e) = self.store.link_episode(episode.uuid, resolved.uuid).await {
                warn!(name = %resolved.name, error = %e, "episode link failed");
            }
            entities.push(resolved);
        }
        entities
    }

    /// Create edges for relations whose endpoints resolve against the
    /// just-stored entity set (case-insensitive name lookup). Unresolvable
    /// relations and per-edge write failures are skipped.
    async fn store_edges(
        &self,
        relations: &[ExtractedRelation],
        entities: &[Entity],
        group_id: &str,
        episode: &Episode,
        valid_at: chrono::DateTime<Utc>,
    ) -> Vec<Edge> {
        let by_name: HashMap<String, &Entity> = entities
            .iter()
            .map(|e| (e.name.to_lowercase(), e))
            .collect();

        let mut edges = Vec::new();
        for rel in relations {
            let source = by_name.get(&rel.source.to_lowercase());
            let target = by_name.get(&rel.target.to_lowercase());
            let (Some(source), Some(target)) = (source, target) else {
                warn!(
                    source = %rel.source,
                    target = %rel.target,
                    "skipping relation: endpoint entity not found"
                );
                continue;
            };

            let edge = Edge::new(
                source.uuid,
                target.uuid,
                &rel.relation,
                &rel.fact,
                group_id,
                episode.uuid,
                valid_at,
            );

            match self.write_edge(&edge).await {
                Ok(()) => edges.push(edge),
                Err(e) => warn!(relation = %rel.relation, error = %e, "failed to create edge"),
            }
        }
        edges
    }

    async fn write_edge(&self, edge: &Edge) -> KontextResult<()> {
        if self.edge_policy == EdgePolicy::MergeOnDuplicateTriple
            && self.store.merge_edge(edge).await?
        {
            return Ok(());
        }
        self.store.create_edge(edge).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KontextError;
    use crate::types::{EdgeRow, GroupScope};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use uuid::Uuid;

    /// Scripted model client: pops canned JSON responses in call order.
    struct ScriptedLlm {
        responses: Mutex<Vec<KontextResult<serde_json::Value>>>,
        calls: Mutex<usize>,
    }

    impl ScriptedLlm {
        fn new(responses: Vec<KontextResult<serde_json::Value>>) -> Self {
            Self {
                responses: Mutex::new(responses),
                calls: Mutex::new(0),
            }
        }

        fn call_count(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedLlm {
        async fn generate_text(&self, _messages: &[Message]) -> KontextResult<String> {
            Ok(String::new())
        }

        async fn generate_json(&self, _messages: &[Message]) -> KontextResult<serde_json::Value> {
            *self.calls.lock().unwrap() += 1;
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                return Ok(json!({}));
            }
            responses.remove(0)
        }

        async fn embed(&self, _text: &str) -> KontextResult<Vec<f32>> {
            Ok(vec![])
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    /// Minimal in-memory store recording everything it is asked to persist.
    #[derive(Default)]
    struct RecordingStore {
        episodes: Mutex<Vec<Episode>>,
        entities: Mutex<Vec<Entity>>,
        edges: Mutex<Vec<Edge>>,
        links: Mutex<Vec<(Uuid, Uuid)>>,
    }

    #[async_trait]
    impl GraphStore for RecordingStore {
        async fn create_episode(&self, episode: &Episode) -> KontextResult<()> {
            self.episodes.lock().unwrap().push(episode.clone());
            Ok(())
        }

        async fn upsert_entity(&self, entity: &Entity) -> KontextResult<Entity> {
            let mut entities = self.entities.lock().unwrap();
            if let Some(existing) = entities
                .iter()
                .find(|e| e.name == entity.name && e.group_id == entity.group_id)
            {
                return Ok(existing.clone());
            }
            entities.push(entity.clone());
            Ok(entity.clone())
        }

        async fn link_episode(&self, episode_uuid: Uuid, entity_uuid: Uuid) -> KontextResult<()> {
            self.links.lock().unwrap().push((episode_uuid, entity_uuid));
            Ok(())
        }

        async fn create_edge(&self, edge: &Edge) -> KontextResult<()> {
            self.edges.lock().unwrap().push(edge.clone());
            Ok(())
        }

        async fn merge_edge(&self, edge: &Edge) -> KontextResult<bool> {
            let mut edges = self.edges.lock().unwrap();
            if let Some(existing) = edges.iter_mut().find(|e| {
                e.source_uuid == edge.source_uuid
                    && e.target_uuid == edge.target_uuid
                    && e.name == edge.name
                    && e.invalid_at.is_none()
            }) {
                existing.episodes.extend(edge.episodes.clone());
                existing.fact = edge.fact.clone();
                return Ok(true);
            }
            Ok(false)
        }

        async fn recent_edges(&self, _group_id: &str, _limit: usize) -> KontextResult<Vec<EdgeRow>> {
            Ok(vec![])
        }

        async fn search_edges(
            &self,
            _query: &str,
            _group_id: &str,
            _limit: usize,
        ) -> KontextResult<Vec<EdgeRow>> {
            Ok(vec![])
        }

        async fn delete_group(&self, _group_id: &str) -> KontextResult<()> {
            Ok(())
        }
    }

    fn entities_response() -> serde_json::Value {
        json!({
            "entities": [
                {"name": "User", "type": "Person"},
                {"name": "Acme", "type": "Organization"}
            ]
        })
    }

    fn relations_response() -> serde_json::Value {
        json!({
            "relations": [{
                "source": "user",
                "relation": "WORKS_AT",
                "target": "ACME",
                "fact": "The user works at Acme."
            }]
        })
    }

    fn options() -> AddOptions {
        AddOptions {
            scope: GroupScope::user("g1"),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_add_stores_episode_entities_and_edges() {
        let store = Arc::new(RecordingStore::default());
        let llm = Arc::new(ScriptedLlm::new(vec![
            Ok(entities_response()),
            Ok(relations_response()),
        ]));
        let adder = MemoryAdder::new(store.clone(), llm, EdgePolicy::AppendOnly);

        let outcome = adder
            .add(&[Message::user("I work at Acme")], &options())
            .await
            .unwrap();

        assert_eq!(outcome.entities.len(), 2);
        assert_eq!(outcome.edges.len(), 1);
        assert_eq!(store.episodes.lock().unwrap().len(), 1);
        assert_eq!(store.links.lock().unwrap().len(), 2);
        assert_eq!(
            outcome.edges[0].episodes,
            vec![outcome.episode.uuid.to_string()]
        );
    }

    #[tokio::test]
    async fn test_entity_extraction_failure_still_persists_episode() {
        let store = Arc::new(RecordingStore::default());
        let llm = Arc::new(ScriptedLlm::new(vec![Err(KontextError::extraction(
            "model unreachable",
        ))]));
        let adder = MemoryAdder::new(store.clone(), llm.clone(), EdgePolicy::AppendOnly);

        let outcome = adder.add(&[Message::user("hello")], &options()).await.unwrap();

        assert!(outcome.entities.is_empty());
        assert!(outcome.edges.is_empty());
        assert_eq!(store.episodes.lock().unwrap().len(), 1);
        // Fewer than 2 entities: the relation prompt is never sent.
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn test_single_entity_skips_relation_extraction() {
        let store = Arc::new(RecordingStore::default());
        let llm = Arc::new(ScriptedLlm::new(vec![Ok(json!({
            "entities": [{"name": "User", "type": "Person"}]
        }))]));
        let adder = MemoryAdder::new(store, llm.clone(), EdgePolicy::AppendOnly);

        let outcome = adder.add(&[Message::user("hi")], &options()).await.unwrap();

        assert_eq!(outcome.entities.len(), 1);
        assert!(outcome.edges.is_empty());
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn test_unmatched_relation_endpoint_is_skipped() {
        let store = Arc::new(RecordingStore::default());
        let llm = Arc::new(ScriptedLlm::new(vec![
            Ok(entities_response()),
            Ok(json!({
                "relations": [{
                    "source": "User",
                    "relation": "WORKS_AT",
                    "target": "Acme Corp",
                    "fact": "The user works at Acme Corp."
                }]
            })),
        ]));
        let adder = MemoryAdder::new(store.clone(), llm, EdgePolicy::AppendOnly);

        let outcome = adder
            .add(&[Message::user("I work at Acme Corp")], &options())
            .await
            .unwrap();

        // "Acme Corp" has no match among resolved entities: dropped, no error.
        assert!(outcome.edges.is_empty());
        assert!(store.edges.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_repeat_mention_reuses_entity_row() {
        let store = Arc::new(RecordingStore::default());
        let llm = Arc::new(ScriptedLlm::new(vec![
            Ok(json!({"entities": [{"name": "Alice", "type": "Person"}]})),
            Ok(json!({"entities": [{"name": "Alice", "type": "Guest"}]})),
        ]));
        let adder = MemoryAdder::new(store.clone(), llm, EdgePolicy::AppendOnly);

        let first = adder.add(&[Message::user("Alice")], &options()).await.unwrap();
        let second = adder.add(&[Message::user("Alice again")], &options()).await.unwrap();

        assert_eq!(first.entities[0].uuid, second.entities[0].uuid);
        // The later mention does not revise the stored type.
        assert_eq!(second.entities[0].entity_type, "Person");
        assert_eq!(store.entities.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_append_only_duplicates_edges_merge_policy_folds_them() {
        for (policy, expected_edges) in [
            (EdgePolicy::AppendOnly, 2usize),
            (EdgePolicy::MergeOnDuplicateTriple, 1usize),
        ] {
            let store = Arc::new(RecordingStore::default());
            let llm = Arc::new(ScriptedLlm::new(vec![
                Ok(entities_response()),
                Ok(relations_response()),
                Ok(entities_response()),
                Ok(relations_response()),
            ]));
            let adder = MemoryAdder::new(store.clone(), llm, policy);

            adder.add(&[Message::user("I work at Acme")], &options()).await.unwrap();
            adder.add(&[Message::user("I work at Acme")], &options()).await.unwrap();

            assert_eq!(store.edges.lock().unwrap().len(), expected_edges);
            assert_eq!(store.episodes.lock().unwrap().len(), 2);
            if policy == EdgePolicy::MergeOnDuplicateTriple {
                // Both episodes recorded as provenance on the single edge.
                assert_eq!(store.edges.lock().unwrap()[0].episodes.len(), 2);
            }
        }
    }

    #[tokio::test]
    async fn test_missing_scope_fails_before_any_store_call() {
        let store = Arc::new(RecordingStore::default());
        let llm = Arc::new(ScriptedLlm::new(vec![]));
        let adder = MemoryAdder::new(store.clone(), llm.clone(), EdgePolicy::AppendOnly);

        let err = adder
            .add(&[Message::user("hi")], &AddOptions::default())
            .await
            .unwrap_err();

        assert!(err.is_validation());
        assert!(store.episodes.lock().unwrap().is_empty());
        assert_eq!(llm.call_count(), 0);
    }
}
