//! OpenAI-compatible provider implementation for Confab
//!
//! This module implements the Provider trait against an OpenAI-style
//! `/chat/completions` endpoint. Transient failures are retried up to three
//! times with quadratic backoff; error payloads and empty responses surface
//! as provider errors.

use crate::config::Config;
use crate::error::{ConfabError, Result};
use crate::providers::{ChatMessage, Provider};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Number of attempts before giving up on a request
const MAX_ATTEMPTS: u32 = 3;

/// Per-request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// OpenAI-compatible chat completions provider
///
/// # Examples
///
/// ```no_run
/// use confab::config::Config;
/// use confab::providers::{ChatMessage, OpenAiProvider, Provider};
///
/// # async fn example() -> confab::error::Result<()> {
/// let config = Config::default();
/// let provider = OpenAiProvider::new(&config)?;
/// let response = provider.complete(&[ChatMessage::user("Hello!")]).await?;
/// # Ok(())
/// # }
/// ```
pub struct OpenAiProvider {
    client: Client,
    api_url: String,
    api_key: String,
    model: String,
}

/// Request body for the chat completions endpoint
#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<WireMessage>,
}

/// Message in the provider wire format
///
/// The domain-level cache hint is translated into a `cache_control` block,
/// which caching-capable gateways consume and plain endpoints ignore.
#[derive(Debug, Serialize)]
struct WireMessage {
    role: String,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    cache_control: Option<serde_json::Value>,
}

impl From<&ChatMessage> for WireMessage {
    fn from(msg: &ChatMessage) -> Self {
        Self {
            role: msg.role.clone(),
            content: msg.content.clone(),
            cache_control: msg
                .cache_hint
                .then(|| serde_json::json!({ "type": "ephemeral" })),
        }
    }
}

/// Response body from the chat completions endpoint
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}

/// Error payload returned by the API
#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
    #[serde(default)]
    r#type: String,
}

impl OpenAiProvider {
    /// Creates a new provider from the runtime configuration
    ///
    /// # Errors
    ///
    /// Returns an error if HTTP client initialization fails
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("confab/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ConfabError::Provider(format!("Failed to create HTTP client: {}", e)))?;

        tracing::debug!(
            url = %config.api_url,
            model = %config.model,
            "Initialized chat completions provider"
        );

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }

    /// Performs a single request against the endpoint
    async fn send_request(&self, request: &ChatCompletionRequest) -> Result<String> {
        let mut builder = self
            .client
            .post(&self.api_url)
            .header("Content-Type", "application/json");

        if !self.api_key.is_empty() {
            builder = builder.bearer_auth(&self.api_key);
        }

        let response = builder
            .json(request)
            .send()
            .await
            .map_err(|e| ConfabError::Provider(format!("Request failed: {}", e)))?;

        let payload: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ConfabError::Provider(format!("Failed to parse response: {}", e)))?;

        if let Some(error) = payload.error {
            return Err(ConfabError::Provider(format!(
                "API error ({}): {}",
                error.r#type, error.message
            ))
            .into());
        }

        let choice = payload.choices.into_iter().next().ok_or_else(|| {
            ConfabError::Provider("No response choices returned".to_string())
        })?;

        Ok(choice.message.content)
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: messages.iter().map(WireMessage::from).collect(),
        };

        let mut last_error = None;
        for attempt in 0..MAX_ATTEMPTS {
            if attempt > 0 {
                let backoff = Duration::from_secs(u64::from(attempt * attempt));
                tracing::debug!(attempt, ?backoff, "Retrying chat completion request");
                tokio::time::sleep(backoff).await;
            }

            match self.send_request(&request).await {
                Ok(content) => return Ok(content),
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "Chat completion attempt failed");
                    last_error = Some(e);
                }
            }
        }

        let err = last_error.unwrap_or_else(|| {
            ConfabError::Provider("Request failed with no recorded error".to_string()).into()
        });
        Err(err.context(format!("failed after {} attempts", MAX_ATTEMPTS)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(api_url: String) -> Config {
        Config {
            api_key: "test-key".to_string(),
            model: "gpt-4o".to_string(),
            os: "Linux".to_string(),
            api_url,
        }
    }

    fn completion_body(content: &str) -> serde_json::Value {
        serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": content } }]
        })
    }

    #[tokio::test]
    async fn test_complete_returns_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("Hello!")))
            .mount(&server)
            .await;

        let config = test_config(format!("{}/v1/chat/completions", server.uri()));
        let provider = OpenAiProvider::new(&config).unwrap();

        let response = provider
            .complete(&[ChatMessage::user("Hi")])
            .await
            .unwrap();
        assert_eq!(response, "Hello!");
    }

    #[tokio::test]
    async fn test_complete_sends_model_and_messages() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-4o",
                "messages": [{ "role": "user", "content": "Hi" }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("ok")))
            .expect(1)
            .mount(&server)
            .await;

        let config = test_config(server.uri());
        let provider = OpenAiProvider::new(&config).unwrap();
        provider.complete(&[ChatMessage::user("Hi")]).await.unwrap();
    }

    #[tokio::test]
    async fn test_cache_hint_becomes_cache_control() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({
                "messages": [{
                    "role": "system",
                    "content": "Preamble",
                    "cache_control": { "type": "ephemeral" }
                }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("ok")))
            .expect(1)
            .mount(&server)
            .await;

        let config = test_config(server.uri());
        let provider = OpenAiProvider::new(&config).unwrap();
        provider
            .complete(&[ChatMessage::system("Preamble").with_cache_hint()])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_api_error_payload_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "error": { "message": "rate limited", "type": "rate_limit" }
            })))
            .mount(&server)
            .await;

        let config = test_config(server.uri());
        let provider = OpenAiProvider::new(&config).unwrap();

        let err = provider
            .complete(&[ChatMessage::user("Hi")])
            .await
            .unwrap_err();
        let rendered = format!("{:#}", err);
        assert!(rendered.contains("rate limited"));
        assert!(rendered.contains("rate_limit"));
    }

    #[tokio::test]
    async fn test_empty_choices_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "choices": [] })),
            )
            .mount(&server)
            .await;

        let config = test_config(server.uri());
        let provider = OpenAiProvider::new(&config).unwrap();

        let err = provider
            .complete(&[ChatMessage::user("Hi")])
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("No response choices"));
    }

    #[tokio::test]
    async fn test_retries_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("recovered")))
            .mount(&server)
            .await;

        let config = test_config(server.uri());
        let provider = OpenAiProvider::new(&config).unwrap();

        let response = provider
            .complete(&[ChatMessage::user("Hi")])
            .await
            .unwrap();
        assert_eq!(response, "recovered");
    }

    #[tokio::test]
    async fn test_persistent_failure_reports_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;

        let config = test_config(server.uri());
        let provider = OpenAiProvider::new(&config).unwrap();

        let err = provider
            .complete(&[ChatMessage::user("Hi")])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("failed after 3 attempts"));
    }
}
