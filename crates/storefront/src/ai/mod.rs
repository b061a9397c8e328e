//! AI shopping assistant.
//!
//! A florist-assistant system prompt (with the in-stock catalog) is
//! prepended to the shopper's conversation and forwarded to an
//! OpenAI-compatible chat-completions endpoint. Nothing is stored.

mod client;
mod error;
mod prompt;
mod types;

pub use client::OpenAiClient;
pub use error::AiError;
pub use prompt::{PromptProduct, render_system_prompt};
pub use types::{ChatMessage, ChatReply, ChatRole, ChatTurn, MAX_HISTORY, MAX_MESSAGE_CHARS};
