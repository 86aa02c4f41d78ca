//! Core types for kontext.

mod graph;
mod message;
mod scope;
mod search;

pub use graph::*;
pub use message::*;
pub use scope::*;
pub use search::*;
