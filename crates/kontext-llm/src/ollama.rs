//! Ollama provider implementation for local models.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use kontext_core::error::{KontextError, KontextResult};
use kontext_core::memory::parse_json_response;
use kontext_core::traits::{LlmClient, LlmConfig};
use kontext_core::types::{Message, MessageRole};

const OLLAMA_BASE_URL: &str = "http://localhost:11434";
const DEFAULT_CHAT_MODEL: &str = "llama3.2";
const DEFAULT_EMBEDDING_MODEL: &str = "nomic-embed-text";

/// Client for a local Ollama server.
pub struct OllamaClient {
    client: Client,
    config: LlmConfig,
    base_url: String,
    embedding_model: String,
}

#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaMessage,
}

#[derive(Debug, Serialize)]
struct OllamaEmbedRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct OllamaEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl OllamaClient {
    /// Create a new Ollama client for text generation.
    pub fn new(config: LlmConfig) -> KontextResult<Self> {
        Self::with_embedding_model(config, DEFAULT_EMBEDDING_MODEL.to_string())
    }

    /// Create a client with an explicit embedding model.
    pub fn with_embedding_model(
        config: LlmConfig,
        embedding_model: String,
    ) -> KontextResult<Self> {
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| OLLAMA_BASE_URL.to_string());

        let mut config = config;
        if config.model.is_empty() {
            config.model = DEFAULT_CHAT_MODEL.to_string();
        }

        let embedding_model = if embedding_model.is_empty() {
            DEFAULT_EMBEDDING_MODEL.to_string()
        } else {
            embedding_model
        };

        Ok(Self {
            client: Client::new(),
            config,
            base_url,
            embedding_model,
        })
    }

    async fn chat(&self, messages: &[Message], json_mode: bool) -> KontextResult<String> {
        let ollama_messages: Vec<OllamaMessage> = messages
            .iter()
            .map(|m| OllamaMessage {
                role: match m.role {
                    MessageRole::System => "system".to_string(),
                    MessageRole::Assistant => "assistant".to_string(),
                    MessageRole::User => "user".to_string(),
                },
                content: m.content.clone(),
            })
            .collect();

        let request = OllamaChatRequest {
            model: self.config.model.clone(),
            messages: ollama_messages,
            stream: false,
            format: json_mode.then(|| "json".to_string()),
        };

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| KontextError::extraction_with_source("Ollama API request failed", e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| KontextError::extraction_with_source("Failed to read response body", e))?;

        if !status.is_success() {
            return Err(KontextError::extraction(format!(
                "Ollama API error ({}): {}",
                status, body
            )));
        }

        let response: OllamaChatResponse = serde_json::from_str(&body)
            .map_err(|e| KontextError::extraction_with_source("Failed to parse response", e))?;

        Ok(response.message.content)
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn generate_text(&self, messages: &[Message]) -> KontextResult<String> {
        self.chat(messages, false).await
    }

    async fn generate_json(&self, messages: &[Message]) -> KontextResult<serde_json::Value> {
        let text = self.chat(messages, true).await?;
        parse_json_response(&text)
    }

    async fn embed(&self, text: &str) -> KontextResult<Vec<f32>> {
        let mut embeddings = self.embed_batch(&[text.to_string()]).await?;
        embeddings
            .pop()
            .ok_or_else(|| KontextError::extraction("No embedding returned"))
    }

    async fn embed_batch(&self, texts: &[String]) -> KontextResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = OllamaEmbedRequest {
            model: self.embedding_model.clone(),
            input: texts.to_vec(),
        };

        let response = self
            .client
            .post(format!("{}/api/embed", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| KontextError::extraction_with_source("Ollama embeddings request failed", e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| KontextError::extraction_with_source("Failed to read response body", e))?;

        if !status.is_success() {
            return Err(KontextError::extraction(format!(
                "Ollama embeddings error ({}): {}",
                status, body
            )));
        }

        let response: OllamaEmbedResponse = serde_json::from_str(&body)
            .map_err(|e| KontextError::extraction_with_source("Failed to parse response", e))?;

        Ok(response.embeddings)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
