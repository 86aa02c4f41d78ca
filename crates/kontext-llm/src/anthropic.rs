//! Anthropic (Claude) provider implementation.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use kontext_core::error::{KontextError, KontextResult};
use kontext_core::memory::parse_json_response;
use kontext_core::traits::{LlmClient, LlmConfig};
use kontext_core::types::{Message, MessageRole};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MODEL: &str = "claude-3-5-sonnet-latest";
const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Anthropic client. Text generation only; Anthropic has no embeddings
/// API, so `embed` asks the caller to configure an embedder override.
pub struct AnthropicClient {
    client: Client,
    config: LlmConfig,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<AnthropicMessage>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorDetail,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorDetail {
    message: String,
}

impl AnthropicClient {
    /// Create a new Anthropic client.
    pub fn new(config: LlmConfig) -> KontextResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok())
            .ok_or_else(|| {
                KontextError::config("Anthropic API key not found. Set ANTHROPIC_API_KEY environment variable or provide api_key in config.")
            })?;

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "x-api-key",
            api_key
                .parse()
                .map_err(|_| KontextError::config("Invalid API key format"))?,
        );
        headers.insert(
            "anthropic-version",
            ANTHROPIC_VERSION
                .parse()
                .map_err(|_| KontextError::config("Invalid version header"))?,
        );
        headers.insert(
            "content-type",
            "application/json"
                .parse()
                .map_err(|_| KontextError::config("Invalid content type"))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| KontextError::config(format!("Failed to create HTTP client: {}", e)))?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| ANTHROPIC_API_URL.to_string());

        let mut config = config;
        if config.model.is_empty() {
            config.model = DEFAULT_MODEL.to_string();
        }

        Ok(Self {
            client,
            config,
            base_url,
        })
    }

    async fn complete(&self, messages: &[Message]) -> KontextResult<String> {
        let system_msg = messages
            .iter()
            .find(|m| matches!(m.role, MessageRole::System))
            .map(|m| m.content.clone());

        let conversation_msgs: Vec<AnthropicMessage> = messages
            .iter()
            .filter(|m| !matches!(m.role, MessageRole::System))
            .map(|m| AnthropicMessage {
                role: match m.role {
                    MessageRole::Assistant => "assistant".to_string(),
                    _ => "user".to_string(),
                },
                content: m.content.clone(),
            })
            .collect();

        let request = AnthropicRequest {
            model: self.config.model.clone(),
            max_tokens: DEFAULT_MAX_TOKENS,
            system: system_msg,
            messages: conversation_msgs,
        };

        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| KontextError::extraction_with_source("Anthropic API request failed", e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| KontextError::extraction_with_source("Failed to read response body", e))?;

        if !status.is_success() {
            let error: Result<AnthropicError, _> = serde_json::from_str(&body);
            let message = error.map(|e| e.error.message).unwrap_or(body);
            return Err(KontextError::extraction(format!(
                "Anthropic API error ({}): {}",
                status, message
            )));
        }

        let response: AnthropicResponse = serde_json::from_str(&body)
            .map_err(|e| KontextError::extraction_with_source("Failed to parse response", e))?;

        response
            .content
            .iter()
            .find(|c| c.content_type == "text")
            .and_then(|c| c.text.clone())
            .ok_or_else(|| KontextError::extraction("Response contained no text content"))
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn generate_text(&self, messages: &[Message]) -> KontextResult<String> {
        self.complete(messages).await
    }

    async fn generate_json(&self, messages: &[Message]) -> KontextResult<serde_json::Value> {
        // No native JSON mode; steer the model and parse defensively.
        let mut messages = messages.to_vec();
        messages.push(Message::user(
            "Respond with valid JSON only. Do not include any text outside the JSON object.",
        ));
        let text = self.complete(&messages).await?;
        parse_json_response(&text)
    }

    async fn embed(&self, _text: &str) -> KontextResult<Vec<f32>> {
        Err(KontextError::config(
            "Anthropic does not provide an embeddings API. Configure an embedder override (openai, gemini, or ollama).",
        ))
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
