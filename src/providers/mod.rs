//! Generation-service providers for Confab
//!
//! Defines the Provider trait consumed by the conversation manager and the
//! adaptive pruning strategy, along with the OpenAI-compatible
//! implementation.

pub mod base;
pub mod openai;

pub use base::{ChatMessage, Provider};
pub use openai::OpenAiProvider;
