//! Base provider trait and message types for Confab
//!
//! This module defines the Provider trait implemented by generation-service
//! clients, along with the chat message type exchanged with them.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Message structure for an outbound chat request
///
/// A flattened view of the conversation sent to the provider. The optional
/// cache hint is opaque to the core; providers that support prompt caching
/// translate it into their wire format, others ignore it. The prompt
/// builder sets it on the leading system message only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender (system, user, assistant)
    pub role: String,
    /// Content of the message
    pub content: String,
    /// Provider-side prompt-caching hint
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub cache_hint: bool,
}

impl ChatMessage {
    /// Creates a new user message
    ///
    /// # Examples
    ///
    /// ```
    /// use confab::providers::ChatMessage;
    ///
    /// let msg = ChatMessage::user("Hello!");
    /// assert_eq!(msg.role, "user");
    /// ```
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
            cache_hint: false,
        }
    }

    /// Creates a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
            cache_hint: false,
        }
    }

    /// Creates a new system message
    ///
    /// # Examples
    ///
    /// ```
    /// use confab::providers::ChatMessage;
    ///
    /// let msg = ChatMessage::system("You are a helpful assistant");
    /// assert_eq!(msg.role, "system");
    /// ```
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
            cache_hint: false,
        }
    }

    /// Marks this message with the provider-side cache hint
    pub fn with_cache_hint(mut self) -> Self {
        self.cache_hint = true;
        self
    }
}

/// Provider trait for generation services
///
/// The core talks to exactly one provider per invocation through this
/// trait; both the conversation manager and the adaptive pruning strategy
/// consume it.
///
/// # Examples
///
/// ```
/// use confab::providers::{ChatMessage, Provider};
/// use confab::error::Result;
/// use async_trait::async_trait;
///
/// struct EchoProvider;
///
/// #[async_trait]
/// impl Provider for EchoProvider {
///     async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
///         Ok(messages.last().map(|m| m.content.clone()).unwrap_or_default())
///     }
/// }
/// ```
#[async_trait]
pub trait Provider: Send + Sync {
    /// Completes a conversation and returns the assistant's response text
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails after retries or the response
    /// payload is malformed.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;
}
