//! Context formatting: render a `SearchResult` into a prompt section.

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::KontextResult;
use crate::traits::GraphStore;
use crate::types::{Relation, SearchMode, SearchOptions, SearchResult};

use super::search::MemorySearcher;

/// Sentinel returned when no section has content, so callers can always
/// interpolate the result into a prompt.
pub const NO_CONTEXT_SENTINEL: &str = "No relevant context found.";

/// Formats search results as a Markdown-style context block.
pub struct ContextBuilder {
    searcher: MemorySearcher,
}

impl ContextBuilder {
    /// Create a builder over the given store.
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self {
            searcher: MemorySearcher::new(store),
        }
    }

    /// Search and format in one call. Defaults: balanced mode, limit 15.
    pub async fn get_context(&self, query: &str, options: &SearchOptions) -> KontextResult<String> {
        let effective = SearchOptions {
            scope: options.scope.clone(),
            mode: Some(options.mode.unwrap_or(SearchMode::Balanced)),
            limit: Some(options.limit.unwrap_or(15)),
            as_of: options.as_of,
        };
        let results = self.searcher.search(query, &effective).await?;
        Ok(format_context(&results))
    }
}

/// Render a `SearchResult` into up to three sections in fixed order,
/// omitting empty ones.
pub fn format_context(results: &SearchResult) -> String {
    let mut sections: Vec<String> = Vec::new();

    if !results.facts.is_empty() {
        let bullets: Vec<String> = results.facts.iter().map(|f| format!("- {}", f)).collect();
        sections.push(format!("## Known Facts\n{}", bullets.join("\n")));
    }

    if !results.relations.is_empty() {
        let bullets: Vec<String> = dedupe_relations(&results.relations)
            .iter()
            .map(|r| format!("- {} → {} → {}", r.source, r.relation, r.target))
            .collect();
        sections.push(format!("## Relationships\n{}", bullets.join("\n")));
    }

    if !results.entities.is_empty() {
        let bullets: Vec<String> = results
            .entities
            .iter()
            .map(|e| format!("- {} ({})", e.name, e.entity_type))
            .collect();
        sections.push(format!("## Entities\n{}", bullets.join("\n")));
    }

    if sections.is_empty() {
        return NO_CONTEXT_SENTINEL.to_string();
    }

    sections.join("\n\n")
}

/// Keep the first occurrence of each exact (source, relation, target) triple.
fn dedupe_relations(relations: &[Relation]) -> Vec<&Relation> {
    let mut seen = HashSet::new();
    relations
        .iter()
        .filter(|r| seen.insert(format!("{}-{}-{}", r.source, r.relation, r.target)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EntitySummary;

    fn relation(source: &str, rel: &str, target: &str) -> Relation {
        Relation {
            source: source.to_string(),
            relation: rel.to_string(),
            target: target.to_string(),
            fact: format!("{} {} {}", source, rel, target),
            valid_at: None,
        }
    }

    #[test]
    fn test_empty_result_returns_sentinel() {
        let result = SearchResult::default();
        assert_eq!(format_context(&result), NO_CONTEXT_SENTINEL);
    }

    #[test]
    fn test_sections_render_in_fixed_order() {
        let result = SearchResult {
            facts: vec!["Alice works at Acme.".to_string()],
            relations: vec![relation("Alice", "WORKS_AT", "Acme")],
            entities: vec![EntitySummary {
                name: "Alice".to_string(),
                entity_type: "Person".to_string(),
                summary: String::new(),
            }],
            episodes: vec![],
            score: 1.0,
        };

        let context = format_context(&result);
        let facts_at = context.find("## Known Facts").unwrap();
        let relations_at = context.find("## Relationships").unwrap();
        let entities_at = context.find("## Entities").unwrap();
        assert!(facts_at < relations_at && relations_at < entities_at);
        assert!(context.contains("- Alice → WORKS_AT → Acme"));
        assert!(context.contains("- Alice (Person)"));
    }

    #[test]
    fn test_duplicate_triples_render_once() {
        let result = SearchResult {
            relations: vec![
                relation("Alice", "WORKS_AT", "Acme"),
                relation("Alice", "WORKS_AT", "Acme"),
            ],
            score: 1.0,
            ..Default::default()
        };

        let context = format_context(&result);
        let bullets = context.matches("- Alice → WORKS_AT → Acme").count();
        assert_eq!(bullets, 1);
    }

    #[test]
    fn test_empty_sections_are_omitted() {
        let result = SearchResult {
            facts: vec!["Bob likes tea.".to_string()],
            ..Default::default()
        };

        let context = format_context(&result);
        assert!(context.contains("## Known Facts"));
        assert!(!context.contains("## Relationships"));
        assert!(!context.contains("## Entities"));
    }
}
