//! Factory for creating LLM clients.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use kontext_core::error::KontextResult;
use kontext_core::traits::{
    EmbedderConfig, EmbedderProvider, LlmClient, LlmConfig, LlmProvider, LlmProviderConfig,
};
use kontext_core::types::Message;

use crate::anthropic::AnthropicClient;
use crate::gemini::GeminiClient;
use crate::ollama::OllamaClient;
use crate::openai::OpenAIClient;

/// Factory for creating LLM clients.
pub struct LlmClientFactory;

impl LlmClientFactory {
    /// Create a client from the given configuration. When an embedder
    /// override is present, the returned client generates text with the
    /// primary provider and embeds with the override provider.
    pub fn create(
        llm: &LlmProviderConfig,
        embedder: Option<&EmbedderConfig>,
    ) -> KontextResult<Arc<dyn LlmClient>> {
        let generation = Self::create_generation(llm)?;
        debug!(provider = ?llm.provider, model = generation.model_name(), "LLM client created");

        match embedder {
            Some(embedder) => {
                let embedding = Self::create_embedder(embedder)?;
                Ok(Arc::new(CompositeClient {
                    generation,
                    embedding,
                }))
            }
            // Anthropic has no embeddings API; borrow OpenAI embeddings when
            // a key is in the environment, as the default override.
            None if llm.provider == LlmProvider::Anthropic
                && std::env::var("OPENAI_API_KEY").is_ok() =>
            {
                let embedding = Self::create_embedder(&EmbedderConfig::default())?;
                Ok(Arc::new(CompositeClient {
                    generation,
                    embedding,
                }))
            }
            None => Ok(generation),
        }
    }

    fn create_generation(llm: &LlmProviderConfig) -> KontextResult<Arc<dyn LlmClient>> {
        let config = llm.config.clone();
        match llm.provider {
            LlmProvider::OpenAI => Ok(Arc::new(OpenAIClient::new(config)?)),
            LlmProvider::Anthropic => Ok(Arc::new(AnthropicClient::new(config)?)),
            LlmProvider::Gemini => Ok(Arc::new(GeminiClient::new(config)?)),
            LlmProvider::Ollama => Ok(Arc::new(OllamaClient::new(config)?)),
        }
    }

    fn create_embedder(embedder: &EmbedderConfig) -> KontextResult<Arc<dyn LlmClient>> {
        let config = LlmConfig {
            model: String::new(),
            api_key: embedder.api_key.clone(),
            base_url: embedder.base_url.clone(),
        };
        match embedder.provider {
            EmbedderProvider::OpenAI => Ok(Arc::new(OpenAIClient::with_embedding_model(
                config,
                embedder.model.clone(),
                embedder.dimensions.map(|d| d as u32),
            )?)),
            EmbedderProvider::Gemini => Ok(Arc::new(GeminiClient::with_embedding_model(
                config,
                embedder.model.clone(),
            )?)),
            EmbedderProvider::Ollama => Ok(Arc::new(OllamaClient::with_embedding_model(
                config,
                embedder.model.clone(),
            )?)),
        }
    }
}

/// Pairs a generation provider with a separate embedding provider.
struct CompositeClient {
    generation: Arc<dyn LlmClient>,
    embedding: Arc<dyn LlmClient>,
}

#[async_trait]
impl LlmClient for CompositeClient {
    async fn generate_text(&self, messages: &[Message]) -> KontextResult<String> {
        self.generation.generate_text(messages).await
    }

    async fn generate_json(&self, messages: &[Message]) -> KontextResult<serde_json::Value> {
        self.generation.generate_json(messages).await
    }

    async fn embed(&self, text: &str) -> KontextResult<Vec<f32>> {
        self.embedding.embed(text).await
    }

    async fn embed_batch(&self, texts: &[String]) -> KontextResult<Vec<Vec<f32>>> {
        self.embedding.embed_batch(texts).await
    }

    fn model_name(&self) -> &str {
        self.generation.model_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ollama_needs_no_api_key() {
        let llm = LlmProviderConfig {
            provider: LlmProvider::Ollama,
            config: LlmConfig::default(),
        };
        let client = LlmClientFactory::create(&llm, None).unwrap();
        assert_eq!(client.model_name(), "llama3.2");
    }

    #[test]
    fn test_composite_reports_generation_model() {
        let llm = LlmProviderConfig {
            provider: LlmProvider::Ollama,
            config: LlmConfig {
                model: "qwen2.5".to_string(),
                ..Default::default()
            },
        };
        let embedder = EmbedderConfig {
            provider: EmbedderProvider::Ollama,
            ..Default::default()
        };
        let client = LlmClientFactory::create(&llm, Some(&embedder)).unwrap();
        assert_eq!(client.model_name(), "qwen2.5");
    }

    #[tokio::test]
    async fn test_anthropic_embed_needs_override() {
        let client = AnthropicClient::new(LlmConfig {
            api_key: Some("test-key".to_string()),
            ..Default::default()
        })
        .unwrap();
        let err = client.embed("hello").await.unwrap_err();
        assert!(matches!(
            err,
            kontext_core::error::KontextError::Config(_)
        ));
    }
}
