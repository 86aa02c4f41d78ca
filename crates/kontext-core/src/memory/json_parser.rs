//! Parsing utilities for LLM JSON responses.

use regex::Regex;
use serde::Deserialize;

use crate::error::{KontextError, KontextResult};

use super::prompts::{ExtractedEntity, ExtractedRelation};

/// Strip a surrounding ```json ... ``` fence, if any.
pub fn remove_code_blocks(content: &str) -> String {
    let content = content.trim();
    let code_re = Regex::new(r"^```[a-zA-Z0-9]*\n?([\s\S]*?)\n?```$").unwrap();
    code_re
        .captures(content)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_else(|| content.to_string())
}

/// Extract the first JSON object from free-form model output. Falls back to
/// the outermost brace span when the response carries prose around the JSON.
pub fn extract_json(text: &str) -> String {
    let cleaned = remove_code_blocks(text);
    if cleaned.starts_with('{') {
        return cleaned;
    }
    let brace_re = Regex::new(r"\{[\s\S]*\}").unwrap();
    brace_re
        .find(&cleaned)
        .map(|m| m.as_str().to_string())
        .unwrap_or(cleaned)
}

/// Parse free-form model output into a JSON value.
pub fn parse_json_response(text: &str) -> KontextResult<serde_json::Value> {
    let json_str = extract_json(text);
    serde_json::from_str(&json_str).map_err(|e| {
        KontextError::extraction_with_source("Failed to parse model output as JSON", e)
    })
}

#[derive(Debug, Default, Deserialize)]
struct EntitiesResponse {
    #[serde(default)]
    entities: Vec<ExtractedEntity>,
}

#[derive(Debug, Default, Deserialize)]
struct RelationsResponse {
    #[serde(default)]
    relations: Vec<ExtractedRelation>,
}

/// Parse the entity-extraction response. A missing `entities` key yields an
/// empty list; malformed JSON is an extraction error.
pub fn parse_extracted_entities(value: &serde_json::Value) -> KontextResult<Vec<ExtractedEntity>> {
    let parsed: EntitiesResponse = serde_json::from_value(value.clone()).map_err(|e| {
        KontextError::extraction_with_source("Unexpected entity extraction shape", e)
    })?;
    Ok(parsed.entities)
}

/// Parse the relation-extraction response. A missing `relations` key yields
/// an empty list.
pub fn parse_extracted_relations(
    value: &serde_json::Value,
) -> KontextResult<Vec<ExtractedRelation>> {
    let parsed: RelationsResponse = serde_json::from_value(value.clone()).map_err(|e| {
        KontextError::extraction_with_source("Unexpected relation extraction shape", e)
    })?;
    Ok(parsed.relations)
}
