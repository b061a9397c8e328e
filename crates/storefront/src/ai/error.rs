//! Error types for the chat-completions client.

use thiserror::Error;

/// Errors that can occur when talking to the model provider.
#[derive(Debug, Error)]
pub enum AiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider returned an error.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message.
        message: String,
    },

    /// Rate limited by the provider.
    #[error("rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Authentication failed.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Failed to parse response.
    #[error("parse error: {0}")]
    Parse(String),

    /// The response had no message content.
    #[error("empty completion")]
    EmptyCompletion,

    /// Invalid chat input from the shopper.
    #[error("{0}")]
    InvalidInput(String),

    /// System prompt rendering failed.
    #[error("template error: {0}")]
    Template(#[from] askama::Error),
}

/// Error body returned by OpenAI-compatible APIs.
#[derive(Debug, serde::Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiError,
}

/// Nested error details.
#[derive(Debug, serde::Deserialize)]
pub struct ApiError {
    pub message: String,
    #[serde(rename = "type")]
    pub error_type: Option<String>,
}

impl ApiError {
    /// Message prefixed with the provider's error type, when it sent one.
    #[must_use]
    pub fn describe(self) -> String {
        match self.error_type {
            Some(kind) if !kind.is_empty() => format!("{kind}: {}", self.message),
            _ => self.message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ai_error_display() {
        let err = AiError::RateLimited(30);
        assert_eq!(err.to_string(), "rate limited, retry after 30 seconds");

        let err = AiError::Api {
            status: 400,
            message: "model not found".to_string(),
        };
        assert_eq!(err.to_string(), "API error (400): model not found");
    }

    #[test]
    fn test_api_error_deserialization() {
        let json = r#"{
            "error": {
                "message": "Incorrect API key provided",
                "type": "invalid_request_error",
                "code": "invalid_api_key"
            }
        }"#;

        let response: ApiErrorResponse = serde_json::from_str(json).expect("deserialize");
        assert_eq!(response.error.message, "Incorrect API key provided");
        assert_eq!(response.error.error_type.as_deref(), Some("invalid_request_error"));
        assert_eq!(
            response.error.describe(),
            "invalid_request_error: Incorrect API key provided"
        );
    }

    #[test]
    fn test_api_error_without_type_keeps_message() {
        let json = r#"{"error": {"message": "model overloaded"}}"#;
        let response: ApiErrorResponse = serde_json::from_str(json).expect("deserialize");
        assert_eq!(response.error.describe(), "model overloaded");
    }
}
