//! Persistent conversation context for a directory
//!
//! The store is the aggregate root for one conversation thread: the ordered
//! message history, an optional cached directory analysis, and running
//! metadata. It carries no policy beyond accessors and metadata upkeep;
//! pruning decisions live in [`crate::context::pruner`] and
//! [`crate::context::guard`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::context::estimator;
use crate::context::limits::MAX_MESSAGE_LENGTH;

/// Current on-disk schema version
const STORE_VERSION: &str = "1";

/// A single message in the conversation
///
/// Messages are immutable once created; insertion order is semantically
/// significant because recency rules depend on position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the sender (system, user, assistant)
    pub role: String,
    /// Free-text content
    pub content: String,
    /// Creation time
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Creates a new message stamped with the current time
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Returns true if this is a system-role message
    pub fn is_system(&self) -> bool {
        self.role == "system"
    }
}

/// Cached directory analysis results
///
/// Produced by the analyzer on explicit user request and treated by the
/// core purely as a sized blob that counts against the token budget and can
/// be discarded wholesale by the emergency guard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisCache {
    /// Indented rendering of the directory tree
    pub file_tree: String,
    /// README excerpt, when one was found
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readme_content: Option<String>,
    /// Detected well-known configuration filenames
    pub primary_configs: Vec<String>,
}

/// Running statistics about the conversation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Number of stored messages; always equals `messages.len()`
    pub total_messages: usize,
    /// Estimated token count of messages plus analysis cache
    pub total_tokens_estimate: usize,
    /// Cumulative number of prune events; survives resets
    pub prune_count: usize,
}

/// Persistent conversation context for one directory
///
/// Created empty on first access per directory, loaded from storage on
/// subsequent access, mutated only by the manager and pruning components,
/// and persisted after each query cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextStore {
    /// Schema version of the on-disk document
    pub version: String,
    /// Absolute directory path this context belongs to
    pub directory: PathBuf,
    /// Creation time of the store
    pub created_at: DateTime<Utc>,
    /// Time of the last persist
    pub updated_at: DateTime<Utc>,
    /// Time the analysis cache was last refreshed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_analysis_at: Option<DateTime<Utc>>,
    /// Cached directory analysis, when one exists
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_cache: Option<AnalysisCache>,
    /// Ordered conversation history
    pub messages: Vec<Message>,
    /// Running statistics
    pub metadata: Metadata,
}

impl ContextStore {
    /// Creates a new, empty context store for the given directory
    ///
    /// # Examples
    ///
    /// ```
    /// use confab::context::store::ContextStore;
    ///
    /// let store = ContextStore::new("/some/project");
    /// assert!(store.messages.is_empty());
    /// assert_eq!(store.metadata.prune_count, 0);
    /// ```
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        let now = Utc::now();
        Self {
            version: STORE_VERSION.to_string(),
            directory: directory.into(),
            created_at: now,
            updated_at: now,
            last_analysis_at: None,
            analysis_cache: None,
            messages: Vec::new(),
            metadata: Metadata::default(),
        }
    }

    /// Appends a message, applying the per-message content cap
    ///
    /// Content longer than [`MAX_MESSAGE_LENGTH`] bytes is truncated on a
    /// char boundary and an explicit truncation marker is appended.
    pub fn add_message(&mut self, role: impl Into<String>, content: impl Into<String>) {
        let content = truncate_content(content.into());
        self.messages.push(Message::new(role, content));
        self.refresh_metadata();
    }

    /// Estimates the current token count of messages plus analysis cache
    pub fn estimate_tokens(&self) -> usize {
        estimator::estimate_store(&self.messages, self.analysis_cache.as_ref())
    }

    /// Recomputes the message-count and token-estimate metadata
    ///
    /// Must be called after every mutation that will be followed by a
    /// persist, so that the stored metadata matches the stored content.
    pub fn refresh_metadata(&mut self) {
        self.metadata.total_messages = self.messages.len();
        self.metadata.total_tokens_estimate = self.estimate_tokens();
    }

    /// Installs a fresh analysis cache and stamps its refresh time
    pub fn set_analysis_cache(&mut self, cache: AnalysisCache) {
        self.analysis_cache = Some(cache);
        self.last_analysis_at = Some(Utc::now());
        self.refresh_metadata();
    }

    /// Discards the analysis cache and its refresh marker
    pub fn clear_analysis_cache(&mut self) {
        self.analysis_cache = None;
        self.last_analysis_at = None;
        self.refresh_metadata();
    }

    /// Clears all messages and the analysis cache
    ///
    /// The cumulative prune counter is preserved across resets.
    pub fn reset(&mut self) {
        self.messages.clear();
        self.analysis_cache = None;
        self.last_analysis_at = None;
        self.metadata = Metadata {
            prune_count: self.metadata.prune_count,
            ..Metadata::default()
        };
    }

    /// Returns the directory path as a display string
    pub fn directory_display(&self) -> String {
        self.directory.display().to_string()
    }

    /// Returns the directory path
    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

/// Caps message content at [`MAX_MESSAGE_LENGTH`] bytes
///
/// Truncated content carries a marker naming the original length. The
/// result never exceeds the cap by more than the marker itself.
fn truncate_content(content: String) -> String {
    if content.len() <= MAX_MESSAGE_LENGTH {
        return content;
    }

    let original_len = content.chars().count();
    let mut end = MAX_MESSAGE_LENGTH;
    while !content.is_char_boundary(end) {
        end -= 1;
    }

    format!(
        "{}\n\n[Content truncated - original length {} characters]",
        &content[..end],
        original_len
    )
}
