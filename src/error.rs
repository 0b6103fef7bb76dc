//! Error types for Confab
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for Confab operations
///
/// This enum encompasses all possible errors that can occur during
/// configuration loading, provider interactions, context persistence,
/// directory analysis, and pruning.
#[derive(Error, Debug)]
pub enum ConfabError {
    /// Configuration-related errors (missing credentials, bad values)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Provider-related errors (API calls, malformed responses)
    #[error("Provider error: {0}")]
    Provider(String),

    /// Context storage errors (corrupt files, write failures)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Directory analysis errors
    #[error("Analysis error: {0}")]
    Analysis(String),

    /// Pruning errors (malformed adaptive responses)
    #[error("Pruning error: {0}")]
    Pruning(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for Confab operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;
