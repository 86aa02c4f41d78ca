//! Public call-surface types for add, search, and context retrieval.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::graph::{Edge, Entity, Episode};
use super::scope::GroupScope;

/// Search depth mode. Currently only influences the default result limit,
/// not the retrieval algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    Fast,
    #[default]
    Balanced,
    Deep,
}

impl SearchMode {
    /// Default result limit for the mode.
    pub fn default_limit(&self) -> usize {
        match self {
            SearchMode::Fast => 10,
            SearchMode::Balanced => 20,
            SearchMode::Deep => 50,
        }
    }
}

/// Options for `search` and `get_context`.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub scope: GroupScope,
    pub mode: Option<SearchMode>,
    pub limit: Option<usize>,
    /// Accepted for forward compatibility; not yet applied as a filter.
    pub as_of: Option<DateTime<Utc>>,
}

impl SearchOptions {
    /// Search options scoped to a user.
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            scope: GroupScope::user(user_id),
            ..Default::default()
        }
    }
}

/// Options for `add`.
#[derive(Debug, Clone, Default)]
pub struct AddOptions {
    pub scope: GroupScope,
    /// Caller-supplied validity timestamp; defaults to ingestion time.
    pub valid_at: Option<DateTime<Utc>>,
    /// When true, the pipeline runs detached and `add` returns immediately
    /// with zero counts plus a task handle.
    pub background: bool,
}

impl AddOptions {
    /// Add options scoped to a user.
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            scope: GroupScope::user(user_id),
            ..Default::default()
        }
    }
}

/// A relation row in a `SearchResult`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relation {
    pub source: String,
    pub relation: String,
    pub target: String,
    pub fact: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_at: Option<DateTime<Utc>>,
}

/// A deduplicated entity row in a `SearchResult`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitySummary {
    pub name: String,
    pub entity_type: String,
    pub summary: String,
}

/// An episode row. Search never surfaces episodes in this design; the list
/// in `SearchResult` is always empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeSummary {
    pub content: String,
    pub valid_at: DateTime<Utc>,
}

/// Result of a memory search.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResult {
    /// Distinct fact strings, insertion order, first occurrence wins.
    pub facts: Vec<String>,
    /// Relation rows, not deduplicated at this stage.
    pub relations: Vec<Relation>,
    /// Distinct entities keyed by display name, first occurrence wins.
    pub entities: Vec<EntitySummary>,
    /// Always empty.
    pub episodes: Vec<EpisodeSummary>,
    /// Binary relevance: 1.0 if any rows matched, else 0.0.
    pub score: f32,
}

/// Full records produced by one run of the add pipeline.
#[derive(Debug, Clone)]
pub struct AddOutcome {
    pub episode: Episode,
    pub entities: Vec<Entity>,
    pub edges: Vec<Edge>,
}
