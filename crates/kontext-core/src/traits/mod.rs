//! Core traits for kontext providers.

mod graph_store;
mod llm;

pub use graph_store::*;
pub use llm::*;
