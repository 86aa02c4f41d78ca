//! Memory search pipeline: edge retrieval and reshaping.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use crate::error::KontextResult;
use crate::traits::GraphStore;
use crate::types::{EdgeRow, EntitySummary, Relation, SearchOptions, SearchResult};

/// Retrieves stored edges for a group and reshapes them into a
/// `SearchResult`. Both store calls fail soft: a transient store error
/// degrades to "no results" rather than propagating.
pub struct MemorySearcher {
    store: Arc<dyn GraphStore>,
}

impl MemorySearcher {
    /// Create a searcher over the given store.
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    /// Run a search. The primary strategy returns the newest non-invalidated
    /// edges for the group; the substring text search is a coverage fallback
    /// used only when the primary strategy returns zero rows.
    pub async fn search(&self, query: &str, options: &SearchOptions) -> KontextResult<SearchResult> {
        let group_id = options.scope.group_id()?;
        let mode = options.mode.unwrap_or_default();
        let limit = options.limit.unwrap_or_else(|| mode.default_limit());

        let mut rows = self.recent_edges(group_id, limit).await;
        if rows.is_empty() {
            rows = self.search_by_text(query, group_id, limit).await;
        }

        Ok(Self::format_results(rows))
    }

    async fn recent_edges(&self, group_id: &str, limit: usize) -> Vec<EdgeRow> {
        match self.store.recent_edges(group_id, limit).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(group_id, error = %e, "edge fetch failed");
                Vec::new()
            }
        }
    }

    async fn search_by_text(&self, query: &str, group_id: &str, limit: usize) -> Vec<EdgeRow> {
        match self.store.search_edges(query, group_id, limit).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(group_id, error = %e, "text search failed");
                Vec::new()
            }
        }
    }

    fn format_results(rows: Vec<EdgeRow>) -> SearchResult {
        let score = if rows.is_empty() { 0.0 } else { 1.0 };

        let mut facts: Vec<String> = Vec::new();
        let mut relations: Vec<Relation> = Vec::new();
        let mut entity_order: Vec<String> = Vec::new();
        let mut entities: HashMap<String, EntitySummary> = HashMap::new();

        for row in rows {
            if !row.fact.is_empty() && !facts.contains(&row.fact) {
                facts.push(row.fact.clone());
            }

            if !row.source_entity.is_empty()
                && !row.target_entity.is_empty()
                && !row.relation.is_empty()
            {
                relations.push(Relation {
                    source: row.source_entity.clone(),
                    relation: row.relation.clone(),
                    target: row.target_entity.clone(),
                    fact: row.fact.clone(),
                    valid_at: row.valid_at,
                });
            }

            for (name, entity_type) in [
                (&row.source_entity, &row.source_type),
                (&row.target_entity, &row.target_type),
            ] {
                if !name.is_empty() && !entities.contains_key(name) {
                    entity_order.push(name.clone());
                    entities.insert(
                        name.clone(),
                        EntitySummary {
                            name: name.clone(),
                            entity_type: if entity_type.is_empty() {
                                "Entity".to_string()
                            } else {
                                entity_type.clone()
                            },
                            summary: String::new(),
                        },
                    );
                }
            }
        }

        SearchResult {
            facts,
            relations,
            entities: entity_order
                .into_iter()
                .filter_map(|name| entities.remove(&name))
                .collect(),
            episodes: Vec::new(),
            score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KontextError;
    use crate::traits::GraphStore;
    use crate::types::{Edge, Entity, Episode, GroupScope};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use uuid::Uuid;

    /// Store fake with independent scripts for the two read paths.
    struct ScriptedStore {
        recent: Mutex<KontextResult<Vec<EdgeRow>>>,
        text: Mutex<KontextResult<Vec<EdgeRow>>>,
        text_calls: Mutex<usize>,
    }

    impl ScriptedStore {
        fn new(recent: KontextResult<Vec<EdgeRow>>, text: KontextResult<Vec<EdgeRow>>) -> Self {
            Self {
                recent: Mutex::new(recent),
                text: Mutex::new(text),
                text_calls: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl GraphStore for ScriptedStore {
        async fn create_episode(&self, _episode: &Episode) -> KontextResult<()> {
            Ok(())
        }
        async fn upsert_entity(&self, entity: &Entity) -> KontextResult<Entity> {
            Ok(entity.clone())
        }
        async fn link_episode(&self, _ep: Uuid, _en: Uuid) -> KontextResult<()> {
            Ok(())
        }
        async fn create_edge(&self, _edge: &Edge) -> KontextResult<()> {
            Ok(())
        }
        async fn merge_edge(&self, _edge: &Edge) -> KontextResult<bool> {
            Ok(false)
        }
        async fn recent_edges(&self, _group_id: &str, _limit: usize) -> KontextResult<Vec<EdgeRow>> {
            std::mem::replace(&mut *self.recent.lock().unwrap(), Ok(vec![]))
        }
        async fn search_edges(
            &self,
            _query: &str,
            _group_id: &str,
            _limit: usize,
        ) -> KontextResult<Vec<EdgeRow>> {
            *self.text_calls.lock().unwrap() += 1;
            std::mem::replace(&mut *self.text.lock().unwrap(), Ok(vec![]))
        }
        async fn delete_group(&self, _group_id: &str) -> KontextResult<()> {
            Ok(())
        }
    }

    fn row(fact: &str, source: &str, relation: &str, target: &str) -> EdgeRow {
        EdgeRow {
            fact: fact.to_string(),
            source_entity: source.to_string(),
            source_type: "Person".to_string(),
            target_entity: target.to_string(),
            target_type: "Organization".to_string(),
            relation: relation.to_string(),
            valid_at: None,
        }
    }

    fn options() -> SearchOptions {
        SearchOptions {
            scope: GroupScope::user("g1"),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_primary_hit_skips_text_fallback() {
        let store = Arc::new(ScriptedStore::new(
            Ok(vec![row("Alice works at Acme.", "Alice", "WORKS_AT", "Acme")]),
            Ok(vec![]),
        ));
        let searcher = MemorySearcher::new(store.clone());

        let result = searcher.search("anything", &options()).await.unwrap();

        assert_eq!(result.score, 1.0);
        assert_eq!(result.facts, vec!["Alice works at Acme.".to_string()]);
        assert_eq!(*store.text_calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_zero_rows_triggers_text_fallback() {
        let store = Arc::new(ScriptedStore::new(
            Ok(vec![]),
            Ok(vec![row("Bob knows Alice.", "Bob", "KNOWS", "Alice")]),
        ));
        let searcher = MemorySearcher::new(store.clone());

        let result = searcher.search("bob", &options()).await.unwrap();

        assert_eq!(*store.text_calls.lock().unwrap(), 1);
        assert_eq!(result.relations.len(), 1);
        assert_eq!(result.relations[0].relation, "KNOWS");
    }

    #[tokio::test]
    async fn test_store_errors_degrade_to_empty_result() {
        let store = Arc::new(ScriptedStore::new(
            Err(KontextError::store("connection reset")),
            Err(KontextError::store("connection reset")),
        ));
        let searcher = MemorySearcher::new(store);

        let result = searcher.search("q", &options()).await.unwrap();

        assert_eq!(result.score, 0.0);
        assert!(result.facts.is_empty());
        assert!(result.entities.is_empty());
    }

    #[tokio::test]
    async fn test_facts_dedup_relations_do_not() {
        let store = Arc::new(ScriptedStore::new(
            Ok(vec![
                row("Alice works at Acme.", "Alice", "WORKS_AT", "Acme"),
                row("Alice works at Acme.", "Alice", "WORKS_AT", "Acme"),
            ]),
            Ok(vec![]),
        ));
        let searcher = MemorySearcher::new(store);

        let result = searcher.search("q", &options()).await.unwrap();

        assert_eq!(result.facts.len(), 1);
        assert_eq!(result.relations.len(), 2);
        // Entities dedup by display name, first occurrence wins.
        assert_eq!(result.entities.len(), 2);
        assert_eq!(result.entities[0].name, "Alice");
        assert!(result.episodes.is_empty());
    }

    #[tokio::test]
    async fn test_missing_scope_is_validation_error() {
        let store = Arc::new(ScriptedStore::new(Ok(vec![]), Ok(vec![])));
        let searcher = MemorySearcher::new(store);

        let err = searcher
            .search("q", &SearchOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }
}
