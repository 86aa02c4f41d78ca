//! OpenAI provider implementation.

use async_trait::async_trait;

use kontext_core::error::{KontextError, KontextResult};
use kontext_core::memory::parse_json_response;
use kontext_core::traits::{LlmClient, LlmConfig};
use kontext_core::types::{Message, MessageRole};

#[cfg(feature = "openai")]
use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestAssistantMessage, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessage, ChatCompletionRequestUserMessage,
        CreateChatCompletionRequest, CreateEmbeddingRequest, EmbeddingInput, ResponseFormat,
    },
    Client,
};

const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// OpenAI client covering both text generation and embeddings.
pub struct OpenAIClient {
    #[cfg(feature = "openai")]
    client: Client<OpenAIConfig>,
    config: LlmConfig,
    embedding_model: String,
    embedding_dimensions: Option<u32>,
}

impl OpenAIClient {
    /// Create a new OpenAI client for text generation.
    pub fn new(config: LlmConfig) -> KontextResult<Self> {
        Self::with_embedding_model(config, DEFAULT_EMBEDDING_MODEL.to_string(), None)
    }

    /// Create a client with an explicit embedding model, used when this
    /// client backs an embedder override.
    pub fn with_embedding_model(
        config: LlmConfig,
        embedding_model: String,
        embedding_dimensions: Option<u32>,
    ) -> KontextResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .ok_or_else(|| {
                KontextError::config("OpenAI API key not found. Set OPENAI_API_KEY environment variable or provide api_key in config.")
            })?;

        #[cfg(feature = "openai")]
        let openai_config = if let Some(ref base_url) = config.base_url {
            OpenAIConfig::new()
                .with_api_key(api_key)
                .with_api_base(base_url)
        } else {
            OpenAIConfig::new().with_api_key(api_key)
        };

        #[cfg(feature = "openai")]
        let client = Client::with_config(openai_config);

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
            #[cfg(feature = "openai")]
            client,
            config,
            embedding_model,
            embedding_dimensions,
        })
    }

    #[cfg(feature = "openai")]
    fn message_to_openai(msg: &Message) -> ChatCompletionRequestMessage {
        match msg.role {
            MessageRole::System => {
                ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
                    content: async_openai::types::ChatCompletionRequestSystemMessageContent::Text(
                        msg.content.clone(),
                    ),
                    name: None,
                })
            }
            MessageRole::User => {
                ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
                    content: async_openai::types::ChatCompletionRequestUserMessageContent::Text(
                        msg.content.clone(),
                    ),
                    name: None,
                })
            }
            MessageRole::Assistant => {
                ChatCompletionRequestMessage::Assistant(ChatCompletionRequestAssistantMessage {
                    content: Some(
                        async_openai::types::ChatCompletionRequestAssistantMessageContent::Text(
                            msg.content.clone(),
                        ),
                    ),
                    name: None,
                    ..Default::default()
                })
            }
        }
    }

    #[cfg(feature = "openai")]
    async fn chat(
        &self,
        messages: &[Message],
        json_mode: bool,
    ) -> KontextResult<String> {
        let chat_messages: Vec<ChatCompletionRequestMessage> =
            messages.iter().map(Self::message_to_openai).collect();

        let mut request = CreateChatCompletionRequest {
            model: self.config.model.clone(),
            messages: chat_messages,
            ..Default::default()
        };
        if json_mode {
            request.response_format = Some(ResponseFormat::JsonObject);
        }

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| KontextError::extraction_with_source("OpenAI API error", e))?;

        let choice = response
            .choices
            .first()
            .ok_or_else(|| KontextError::extraction("No response choices returned"))?;

        choice
            .message
            .content
            .clone()
            .ok_or_else(|| KontextError::extraction("Response contained no text content"))
    }
}

#[async_trait]
impl LlmClient for OpenAIClient {
    #[cfg(feature = "openai")]
    async fn generate_text(&self, messages: &[Message]) -> KontextResult<String> {
        self.chat(messages, false).await
    }

    #[cfg(not(feature = "openai"))]
    async fn generate_text(&self, _messages: &[Message]) -> KontextResult<String> {
        Err(KontextError::config(
            "OpenAI feature not enabled. Enable the 'openai' feature.",
        ))
    }

    #[cfg(feature = "openai")]
    async fn generate_json(&self, messages: &[Message]) -> KontextResult<serde_json::Value> {
        let text = self.chat(messages, true).await?;
        parse_json_response(&text)
    }

    #[cfg(not(feature = "openai"))]
    async fn generate_json(&self, _messages: &[Message]) -> KontextResult<serde_json::Value> {
        Err(KontextError::config(
            "OpenAI feature not enabled. Enable the 'openai' feature.",
        ))
    }

    #[cfg(feature = "openai")]
    async fn embed(&self, text: &str) -> KontextResult<Vec<f32>> {
        let request = CreateEmbeddingRequest {
            model: self.embedding_model.clone(),
            input: EmbeddingInput::String(text.to_string()),
            dimensions: self.embedding_dimensions,
            ..Default::default()
        };

        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(|e| KontextError::extraction_with_source("OpenAI embeddings error", e))?;

        response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| KontextError::extraction("No embedding returned"))
    }

    #[cfg(not(feature = "openai"))]
    async fn embed(&self, _text: &str) -> KontextResult<Vec<f32>> {
        Err(KontextError::config(
            "OpenAI feature not enabled. Enable the 'openai' feature.",
        ))
    }

    #[cfg(feature = "openai")]
    async fn embed_batch(&self, texts: &[String]) -> KontextResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = CreateEmbeddingRequest {
            model: self.embedding_model.clone(),
            input: EmbeddingInput::StringArray(texts.to_vec()),
            dimensions: self.embedding_dimensions,
            ..Default::default()
        };

        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(|e| KontextError::extraction_with_source("OpenAI embeddings error", e))?;

        let mut data = response.data;
        data.sort_by_key(|d| d.index);
        Ok(data.into_iter().map(|d| d.embedding).collect())
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
