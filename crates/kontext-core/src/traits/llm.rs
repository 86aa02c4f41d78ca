//! LLM client trait and related configuration.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::KontextResult;
use crate::types::Message;

/// Single capability surface every language-model provider implements.
///
/// Providers without a native embeddings API return a `Config` error from
/// `embed`; the factory can wire a composite client that borrows embeddings
/// from another provider.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate a plain-text response.
    async fn generate_text(&self, messages: &[Message]) -> KontextResult<String>;

    /// Generate a response constrained to a JSON object and parse it.
    async fn generate_json(&self, messages: &[Message]) -> KontextResult<serde_json::Value>;

    /// Generate an embedding vector for a single text.
    async fn embed(&self, text: &str) -> KontextResult<Vec<f32>>;

    /// Generate embeddings for multiple texts. Providers with a batch
    /// endpoint should override this.
    async fn embed_batch(&self, texts: &[String]) -> KontextResult<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }

    /// Get the generation model name.
    fn model_name(&self) -> &str;
}

/// LLM provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    OpenAI,
    Anthropic,
    Gemini,
    Ollama,
}

/// Configuration for a text-generation provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Model name; empty means the provider default.
    #[serde(default)]
    pub model: String,
    /// API key (if not using the provider's environment variable).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Base URL override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Provider selection plus provider-specific configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmProviderConfig {
    pub provider: LlmProvider,
    #[serde(flatten)]
    pub config: LlmConfig,
}

/// Embedder provider type. A subset of the LLM providers offer embeddings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmbedderProvider {
    #[default]
    OpenAI,
    Gemini,
    Ollama,
}

/// Configuration for an embedding provider override.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmbedderConfig {
    pub provider: EmbedderProvider,
    /// Model name; empty means the provider default.
    #[serde(default)]
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<usize>,
}
