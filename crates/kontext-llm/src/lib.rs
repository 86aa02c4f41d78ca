//! kontext-llm - LLM provider implementations for kontext.
//!
//! This crate provides the language-model clients used by the kontext
//! memory layer for entity and relation extraction.
//!
//! # Supported Providers
//!
//! - **OpenAI** (feature: `openai`) - GPT-4o family, plus embeddings
//! - **Anthropic** - Claude models (pair with an embedder override)
//! - **Gemini** - Google Gemini models, plus embeddings
//! - **Ollama** - Local models via an Ollama server
//!
//! # Example
//!
//! ```ignore
//! use kontext_core::traits::{LlmProvider, LlmProviderConfig};
//! use kontext_llm::LlmClientFactory;
//!
//! let config = LlmProviderConfig {
//!     provider: LlmProvider::OpenAI,
//!     ..Default::default()
//! };
//! let client = LlmClientFactory::create(&config, None)?;
//! ```

mod anthropic;
mod factory;
mod gemini;
mod ollama;
mod openai;

pub use anthropic::AnthropicClient;
pub use factory::LlmClientFactory;
pub use gemini::GeminiClient;
pub use ollama::OllamaClient;
pub use openai::OpenAIClient;

// Re-export core types for convenience
pub use kontext_core::traits::{
    EmbedderConfig, EmbedderProvider, LlmClient, LlmConfig, LlmProvider, LlmProviderConfig,
};
