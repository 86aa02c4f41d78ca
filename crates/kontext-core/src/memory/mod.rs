//! Memory pipelines: add, search, and context formatting.

mod add;
mod context;
mod json_parser;
mod prompts;
mod search;

pub use add::MemoryAdder;
pub use context::{format_context, ContextBuilder, NO_CONTEXT_SENTINEL};
pub use json_parser::{
    extract_json, parse_extracted_entities, parse_extracted_relations, parse_json_response,
    remove_code_blocks,
};
pub use prompts::{
    build_entity_extraction_messages, build_relation_extraction_messages, ExtractedEntity,
    ExtractedRelation, DEFAULT_ENTITY_TYPES, DEFAULT_RELATION_TYPES,
};
pub use search::MemorySearcher;
