//! Graph record types: episodes, entities, edges.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Origin kind of an ingested episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EpisodeSource {
    #[default]
    Message,
    Document,
    Json,
}

impl EpisodeSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            EpisodeSource::Message => "message",
            EpisodeSource::Document => "document",
            EpisodeSource::Json => "json",
        }
    }
}

/// One ingested unit of conversation, stored verbatim. Write-once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Episode {
    pub uuid: Uuid,
    pub content: String,
    pub source: EpisodeSource,
    pub group_id: String,
    pub valid_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Episode {
    /// Create a new message episode for a group.
    pub fn new(content: impl Into<String>, group_id: impl Into<String>, valid_at: DateTime<Utc>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            content: content.into(),
            source: EpisodeSource::Message,
            group_id: group_id.into(),
            valid_at,
            created_at: Utc::now(),
        }
    }
}

/// A named thing mentioned in conversation. Identity within a group is the
/// exact case-sensitive (name, group_id) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub uuid: Uuid,
    pub name: String,
    pub entity_type: String,
    /// Unpopulated placeholder; extraction never fills it.
    pub summary: String,
    pub group_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity {
    /// Create a fresh entity with a new uuid and empty summary.
    pub fn new(
        name: impl Into<String>,
        entity_type: impl Into<String>,
        group_id: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
            entity_type: entity_type.into(),
            summary: String::new(),
            group_id: group_id.into(),
            embedding: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A directed, labeled, fact-bearing relationship between two entities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub uuid: Uuid,
    pub source_uuid: Uuid,
    pub target_uuid: Uuid,
    /// Relation label, e.g. `WORKS_AT`.
    pub name: String,
    /// Human-readable fact sentence.
    pub fact: String,
    pub group_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    /// Uuids of the episodes this edge was extracted from.
    pub episodes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_at: Option<DateTime<Utc>>,
    /// Schema-present; never written by the add/search pipelines.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invalid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Edge {
    /// Create a new edge between two entities for one episode.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source_uuid: Uuid,
        target_uuid: Uuid,
        name: impl Into<String>,
        fact: impl Into<String>,
        group_id: impl Into<String>,
        episode_uuid: Uuid,
        valid_at: DateTime<Utc>,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            source_uuid,
            target_uuid,
            name: name.into(),
            fact: fact.into(),
            group_id: group_id.into(),
            embedding: None,
            episodes: vec![episode_uuid.to_string()],
            valid_at: Some(valid_at),
            invalid_at: None,
            created_at: Utc::now(),
        }
    }
}

/// Raw row returned by the edge search queries, before reshaping into a
/// `SearchResult`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeRow {
    pub fact: String,
    pub source_entity: String,
    pub source_type: String,
    pub target_entity: String,
    pub target_type: String,
    pub relation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_at: Option<DateTime<Utc>>,
}
