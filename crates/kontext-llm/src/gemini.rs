//! Google Gemini provider implementation.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use kontext_core::error::{KontextError, KontextResult};
use kontext_core::memory::parse_json_response;
use kontext_core::traits::{LlmClient, LlmConfig};
use kontext_core::types::{Message, MessageRole};

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_CHAT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_EMBEDDING_MODEL: &str = "gemini-embedding-001";

/// Google Gemini client covering text generation and embeddings.
pub struct GeminiClient {
    client: Client,
    config: LlmConfig,
    api_key: String,
    base_url: String,
    embedding_model: String,
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct GeminiGenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

#[derive(Debug, Serialize)]
struct GeminiEmbedRequest {
    content: GeminiEmbedContent,
}

#[derive(Debug, Serialize)]
struct GeminiEmbedContent {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiEmbedResponse {
    embedding: GeminiEmbedding,
}

#[derive(Debug, Deserialize)]
struct GeminiEmbedding {
    values: Vec<f32>,
}

impl GeminiClient {
    /// Create a new Gemini client for text generation.
    pub fn new(config: LlmConfig) -> KontextResult<Self> {
        Self::with_embedding_model(config, DEFAULT_EMBEDDING_MODEL.to_string())
    }

    /// Create a client with an explicit embedding model.
    pub fn with_embedding_model(
        config: LlmConfig,
        embedding_model: String,
    ) -> KontextResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("GOOGLE_API_KEY").ok())
            .ok_or_else(|| {
                KontextError::config("Gemini API key not found. Set GOOGLE_API_KEY environment variable or provide api_key in config.")
            })?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| GEMINI_API_URL.to_string());

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
            api_key,
            base_url,
            embedding_model,
        })
    }

    async fn complete(&self, messages: &[Message], json_mode: bool) -> KontextResult<String> {
        let system_instruction = messages
            .iter()
            .find(|m| matches!(m.role, MessageRole::System))
            .map(|m| GeminiContent {
                role: None,
                parts: vec![GeminiPart {
                    text: m.content.clone(),
                }],
            });

        let contents: Vec<GeminiContent> = messages
            .iter()
            .filter(|m| !matches!(m.role, MessageRole::System))
            .map(|m| GeminiContent {
                role: Some(match m.role {
                    MessageRole::Assistant => "model".to_string(),
                    _ => "user".to_string(),
                }),
                parts: vec![GeminiPart {
                    text: m.content.clone(),
                }],
            })
            .collect();

        let request = GeminiRequest {
            contents,
            system_instruction,
            generation_config: json_mode.then(|| GeminiGenerationConfig {
                response_mime_type: "application/json".to_string(),
            }),
        };

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.config.model, self.api_key
        );

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| KontextError::extraction_with_source("Gemini API request failed", e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| KontextError::extraction_with_source("Failed to read response body", e))?;

        if !status.is_success() {
            return Err(KontextError::extraction(format!(
                "Gemini API error ({}): {}",
                status, body
            )));
        }

        let response: GeminiResponse = serde_json::from_str(&body)
            .map_err(|e| KontextError::extraction_with_source("Failed to parse response", e))?;

        response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| KontextError::extraction("Response contained no candidates"))
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn generate_text(&self, messages: &[Message]) -> KontextResult<String> {
        self.complete(messages, false).await
    }

    async fn generate_json(&self, messages: &[Message]) -> KontextResult<serde_json::Value> {
        let text = self.complete(messages, true).await?;
        parse_json_response(&text)
    }

    async fn embed(&self, text: &str) -> KontextResult<Vec<f32>> {
        let request = GeminiEmbedRequest {
            content: GeminiEmbedContent {
                parts: vec![GeminiPart {
                    text: text.to_string(),
                }],
            },
        };

        let url = format!(
            "{}/models/{}:embedContent?key={}",
            self.base_url, self.embedding_model, self.api_key
        );

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| KontextError::extraction_with_source("Gemini embeddings request failed", e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| KontextError::extraction_with_source("Failed to read response body", e))?;

        if !status.is_success() {
            return Err(KontextError::extraction(format!(
                "Gemini embeddings error ({}): {}",
                status, body
            )));
        }

        let response: GeminiEmbedResponse = serde_json::from_str(&body)
            .map_err(|e| KontextError::extraction_with_source("Failed to parse response", e))?;

        Ok(response.embedding.values)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
