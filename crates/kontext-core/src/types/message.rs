//! Message types for conversation ingestion and LLM calls.

use serde::{Deserialize, Serialize};

/// Role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    #[default]
    User,
    Assistant,
}

impl MessageRole {
    /// Get the lowercase string form used in flattened transcripts.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

/// A message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }
}

/// Input type accepting either a bare string or a list of messages.
#[derive(Debug, Clone)]
pub enum MessageInput {
    /// Simple string (converted to a single user message).
    String(String),
    /// List of messages.
    List(Vec<Message>),
}

impl MessageInput {
    /// Normalize any input format to a list of messages.
    pub fn normalize(self) -> Vec<Message> {
        match self {
            MessageInput::String(s) => vec![Message::user(s)],
            MessageInput::List(msgs) => msgs,
        }
    }
}

impl From<&str> for MessageInput {
    fn from(s: &str) -> Self {
        MessageInput::String(s.to_string())
    }
}

impl From<String> for MessageInput {
    fn from(s: String) -> Self {
        MessageInput::String(s)
    }
}

impl From<Vec<Message>> for MessageInput {
    fn from(msgs: Vec<Message>) -> Self {
        MessageInput::List(msgs)
    }
}

/// Flatten messages into one `role: content` transcript, newline-joined.
/// This is the unit of extraction; long conversations are not chunked.
pub fn format_messages(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|msg| format!("{}: {}", msg.role.as_str(), msg.content))
        .collect::<Vec<_>>()
        .join("\n")
}
