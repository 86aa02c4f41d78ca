//! Prompt templates for entity and relation extraction.

use serde::{Deserialize, Serialize};

use crate::types::Message;

/// Canonical entity type vocabulary offered to the model. Free-text types
/// are still accepted on the way back.
pub const DEFAULT_ENTITY_TYPES: &[&str] = &[
    "Person",
    "User",
    "Organization",
    "Location",
    "Event",
    "Product",
    "Service",
    "Concept",
    "Preference",
    "Document",
    "Task",
    "Project",
];

/// Canonical relation label vocabulary offered to the model.
pub const DEFAULT_RELATION_TYPES: &[&str] = &[
    "HAS_NAME",
    "WORKS_AT",
    "LOCATED_IN",
    "BELONGS_TO",
    "RELATED_TO",
    "PREFERS",
    "LIKES",
    "DISLIKES",
    "KNOWS",
    "CREATED",
    "OWNS",
    "PARTICIPATED_IN",
    "MENTIONED",
    "IS_PART_OF",
];

/// A candidate entity returned by extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedEntity {
    pub name: String,
    #[serde(rename = "type")]
    pub entity_type: String,
}

/// A candidate relation returned by extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedRelation {
    pub source: String,
    pub relation: String,
    pub target: String,
    pub fact: String,
}

fn entity_extraction_prompt() -> String {
    format!(
        r#"You are an entity extraction system for an AI memory system.
Extract all entities (people, places, things, concepts) from the conversation.

Common entity types: {}

Rules:
- Extract the entity name exactly as mentioned
- Classify into the most appropriate type (use custom types if needed)
- Include implicit entities (e.g., "my car" → a Product or Thing)
- ALWAYS include "User" as a Person entity to represent the speaker
- Extract any names, places, organizations, preferences, or things mentioned

Respond with JSON:
{{
  "entities": [
    {{ "name": "entity name", "type": "EntityType" }}
  ]
}}"#,
        DEFAULT_ENTITY_TYPES.join(", ")
    )
}

fn relation_extraction_prompt() -> String {
    format!(
        r#"You are a relationship extraction system for an AI memory system.
Given entities and conversation, extract relationships between them.

Common relationship types: {}

Rules:
- Each relationship must connect two extracted entities
- Create a human-readable fact for each relationship
- Facts should be complete sentences
- Use "User" as the source for statements about the speaker (e.g., "my name is X" → User HAS_NAME X)
- Include temporal context if mentioned (dates, times)
- Extract ALL relationships, even simple ones like names and preferences
- Use custom relationship types if the common ones don't fit

Respond with JSON:
{{
  "relations": [
    {{
      "source": "entity name",
      "relation": "RELATION_TYPE",
      "target": "entity name",
      "fact": "Human readable fact sentence"
    }}
  ]
}}"#,
        DEFAULT_RELATION_TYPES.join(", ")
    )
}

/// Build the two-message prompt for entity extraction.
pub fn build_entity_extraction_messages(content: &str, group_id: &str) -> Vec<Message> {
    vec![
        Message::system(entity_extraction_prompt()),
        Message::user(format!(
            "User ID: {}\n\nConversation:\n{}",
            group_id, content
        )),
    ]
}

/// Build the two-message prompt for relation extraction.
pub fn build_relation_extraction_messages(
    content: &str,
    entities: &[ExtractedEntity],
) -> Vec<Message> {
    let entity_list = serde_json::to_string(entities).unwrap_or_else(|_| "[]".to_string());
    vec![
        Message::system(relation_extraction_prompt()),
        Message::user(format!(
            "Entities found: {}\n\nConversation:\n{}",
            entity_list, content
        )),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_prompt_carries_vocabulary_and_user_rule() {
        let messages = build_entity_extraction_messages("user: hi", "g1");
        assert_eq!(messages.len(), 2);
        let system = &messages[0].content;
        assert!(system.contains("Organization"));
        assert!(system.contains(r#"ALWAYS include "User""#));
        assert!(messages[1].content.contains("User ID: g1"));
    }

    #[test]
    fn test_relation_prompt_embeds_entity_list() {
        let entities = vec![ExtractedEntity {
            name: "Alice".into(),
            entity_type: "Person".into(),
        }];
        let messages = build_relation_extraction_messages("user: hi", &entities);
        assert!(messages[0].content.contains("WORKS_AT"));
        assert!(messages[1].content.contains(r#""name":"Alice""#));
    }
}
