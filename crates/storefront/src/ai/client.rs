//! OpenAI-compatible chat-completions client.

use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use tracing::instrument;
use url::Url;

use crate::config::OpenAiConfig;

use super::error::{AiError, ApiErrorResponse};
use super::types::{ChatMessage, ChatRequest, ChatResponse};

const DEFAULT_MAX_TOKENS: u32 = 600;
const DEFAULT_TEMPERATURE: f32 = 0.7;
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Chat-completions client.
///
/// Cheap to clone.
#[derive(Clone)]
pub struct OpenAiClient {
    inner: Arc<OpenAiClientInner>,
}

struct OpenAiClientInner {
    client: reqwest::Client,
    endpoint: Url,
    model: String,
}

impl OpenAiClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is not a valid header value or the
    /// HTTP client cannot be built.
    pub fn new(config: &OpenAiConfig) -> Result<Self, AiError> {
        let bearer = format!("Bearer {}", config.api_key.expose_secret());
        let mut auth = HeaderValue::from_str(&bearer)
            .map_err(|_| AiError::Unauthorized("API key is not a valid header value".to_string()))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        let endpoint = completions_endpoint(&config.base_url)?;

        Ok(Self {
            inner: Arc::new(OpenAiClientInner {
                client,
                endpoint,
                model: config.model.clone(),
            }),
        })
    }

    /// Send the conversation and return the assistant's reply text.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the provider returns an error.
    #[instrument(skip(self, messages), fields(model = %self.inner.model, messages = messages.len()))]
    pub async fn chat(&self, messages: &[ChatMessage]) -> Result<String, AiError> {
        let request = ChatRequest {
            model: &self.inner.model,
            messages,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        };

        let response = self
            .inner
            .client
            .post(self.inner.endpoint.clone())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(handle_error_status(status, response).await);
        }

        let body = response.text().await?;
        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| AiError::Parse(format!("Failed to parse response: {e}")))?;
        parsed.into_text()
    }
}

/// Join `chat/completions` onto the API root, keeping its path.
fn completions_endpoint(base_url: &Url) -> Result<Url, AiError> {
    let mut base = base_url.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join("chat/completions")
        .map_err(|e| AiError::Parse(format!("invalid base URL: {e}")))
}

async fn handle_error_status(status: reqwest::StatusCode, response: reqwest::Response) -> AiError {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok())
            .unwrap_or(60);
        return AiError::RateLimited(retry_after);
    }

    if status == reqwest::StatusCode::UNAUTHORIZED {
        return AiError::Unauthorized("Invalid API key".to_string());
    }

    match response.text().await {
        Ok(body) => {
            let message = serde_json::from_str::<ApiErrorResponse>(&body)
                .map_or(body, |api_error| api_error.error.describe());
            AiError::Api {
                status: status.as_u16(),
                message,
            }
        }
        Err(e) => AiError::Http(e),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_completions_endpoint_keeps_version_path() {
        let base = Url::parse("https://api.openai.com/v1/").unwrap();
        assert_eq!(
            completions_endpoint(&base).unwrap().as_str(),
            "https://api.openai.com/v1/chat/completions"
        );

        let base = Url::parse("http://localhost:11434/v1").unwrap();
        assert_eq!(
            completions_endpoint(&base).unwrap().as_str(),
            "http://localhost:11434/v1/chat/completions"
        );
    }
}
