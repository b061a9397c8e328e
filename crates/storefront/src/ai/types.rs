//! Chat-completions request and response types.

use serde::{Deserialize, Serialize};

use super::AiError;

/// Longest accepted shopper message, in characters.
pub const MAX_MESSAGE_CHARS: usize = 2000;

/// Most history turns forwarded with a request.
pub const MAX_HISTORY: usize = 20;

/// Message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One message sent to the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// Body of `POST /api/ai/chat`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatTurn {
    pub message: String,
    #[serde(default)]
    pub history: Vec<ChatMessage>,
}

impl ChatTurn {
    /// Build the conversation to forward, after the system prompt.
    ///
    /// System messages from the client are dropped and only the most recent
    /// history is kept.
    ///
    /// # Errors
    ///
    /// Returns `AiError::InvalidInput` for a blank or oversized message.
    pub fn into_messages(self) -> Result<Vec<ChatMessage>, AiError> {
        let message = self.message.trim();
        if message.is_empty() {
            return Err(AiError::InvalidInput("message is required".to_string()));
        }
        if message.chars().count() > MAX_MESSAGE_CHARS {
            return Err(AiError::InvalidInput(format!(
                "message must be at most {MAX_MESSAGE_CHARS} characters"
            )));
        }

        let history: Vec<ChatMessage> = self
            .history
            .into_iter()
            .filter(|m| m.role != ChatRole::System && !m.content.trim().is_empty())
            .collect();
        let skip = history.len().saturating_sub(MAX_HISTORY);

        let mut messages: Vec<ChatMessage> = history.into_iter().skip(skip).collect();
        messages.push(ChatMessage::user(message));
        Ok(messages)
    }
}

/// Reply returned to the shopper.
#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub reply: String,
}

#[derive(Debug, Serialize)]
pub(super) struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Deserialize)]
pub(super) struct ChatResponse {
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub(super) struct Choice {
    pub message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
pub(super) struct ResponseMessage {
    pub content: Option<String>,
}

impl ChatResponse {
    /// Text of the first choice.
    pub(super) fn into_text(self) -> Result<String, AiError> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(AiError::EmptyCompletion)
    }
}
