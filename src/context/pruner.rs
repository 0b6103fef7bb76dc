//! Context pruning policy engine
//!
//! Decides whether accumulated conversation state has grown past its limits
//! and shrinks it back toward the target tier. Two strategies exist: an
//! adaptive one that delegates the "which messages are safe to discard"
//! decision to the provider, and a deterministic one that cuts the oldest
//! non-system messages. The adaptive path is soft-zone only; once a hard
//! ceiling is exceeded, or whenever the adaptive path fails, the
//! deterministic cut applies. Pruning never fails the user-facing query.

use std::collections::HashSet;

use chrono::{Duration, Utc};

use crate::context::limits::PruningLimits;
use crate::context::store::{ContextStore, Message};
use crate::error::{ConfabError, Result};
use crate::providers::{ChatMessage, Provider};

/// Minimum message count for the adaptive strategy to be worthwhile
const MIN_MESSAGES_FOR_ADAPTIVE: usize = 10;

/// Number of most-recent messages that always survive pruning
const PRESERVED_RECENT_MESSAGES: usize = 4;

/// Length to which transcript entries are condensed in the pruning prompt
const SUMMARY_CONTENT_LENGTH: usize = 200;

/// Keywords that mark a message as structure-relevant for preservation
const PRESERVE_KEYWORDS: [&str; 5] =
    ["analysis", "file tree", "readme", "structure", "architecture"];

/// Pruning policy engine over one context store
///
/// Holds the limits and an optional provider for the adaptive strategy; the
/// store is threaded through each call explicitly and never retained.
pub struct Pruner<'a> {
    provider: Option<&'a dyn Provider>,
    limits: PruningLimits,
}

impl<'a> Pruner<'a> {
    /// Creates a pruner with the given provider and limits
    ///
    /// Without a provider only the deterministic strategy is available.
    pub fn new(provider: Option<&'a dyn Provider>, limits: PruningLimits) -> Self {
        Self { provider, limits }
    }

    /// Checks whether pruning is needed, returning the reason when it is
    ///
    /// Conditions are evaluated in fixed priority order: hard message
    /// count, hard token estimate, hard age of the oldest message, soft
    /// message count, soft token estimate. The order only affects which
    /// reason is reported.
    pub fn should_prune(&self, store: &ContextStore) -> Option<String> {
        let count = store.messages.len();
        if count >= self.limits.max_messages {
            return Some(format!(
                "hard limit: messages ({} >= {})",
                count, self.limits.max_messages
            ));
        }

        let tokens = store.estimate_tokens();
        if tokens >= self.limits.max_tokens {
            return Some(format!(
                "hard limit: tokens ({} >= {})",
                tokens, self.limits.max_tokens
            ));
        }

        if let Some(oldest) = store.messages.first() {
            let age = Utc::now() - oldest.timestamp;
            if age > Duration::days(self.limits.max_age_days) {
                return Some(format!(
                    "hard limit: age ({} days >= {} days)",
                    age.num_days(),
                    self.limits.max_age_days
                ));
            }
        }

        if count >= self.limits.soft_max_messages {
            return Some(format!(
                "soft limit: messages ({} >= {})",
                count, self.limits.soft_max_messages
            ));
        }

        if tokens >= self.limits.soft_max_tokens {
            return Some(format!(
                "soft limit: tokens ({} >= {})",
                tokens, self.limits.soft_max_tokens
            ));
        }

        None
    }

    /// Prunes the store if any limit is exceeded
    ///
    /// Prefers the adaptive strategy when conditions allow it; any adaptive
    /// failure falls back to the deterministic strategy instead of
    /// propagating.
    pub async fn prune(&self, store: &mut ContextStore) -> Result<()> {
        let Some(reason) = self.should_prune(store) else {
            return Ok(());
        };

        if let Some(provider) = self.provider {
            if self.can_use_adaptive(store) {
                match self.prune_adaptive(provider, store, &reason).await {
                    Ok(()) => return Ok(()),
                    Err(e) => {
                        tracing::warn!(
                            error = %e,
                            "Adaptive pruning failed, falling back to deterministic strategy"
                        );
                    }
                }
            }
        }

        self.prune_deterministic(store);
        Ok(())
    }

    /// Checks whether the adaptive strategy may run
    ///
    /// Adaptive pruning is a soft-zone operation: once a hard ceiling is
    /// exceeded the conversation is cut deterministically without asking.
    fn can_use_adaptive(&self, store: &ContextStore) -> bool {
        if store.messages.len() < MIN_MESSAGES_FOR_ADAPTIVE {
            return false;
        }

        if store.messages.len() >= self.limits.max_messages {
            return false;
        }

        if store.estimate_tokens() >= self.limits.max_tokens {
            return false;
        }

        true
    }

    /// Delegates message selection to the provider and applies the result
    async fn prune_adaptive(
        &self,
        provider: &dyn Provider,
        store: &mut ContextStore,
        reason: &str,
    ) -> Result<()> {
        let prompt = self.build_pruning_prompt(store, reason);
        let request = [ChatMessage::system(prompt)];

        // The response is untrusted, semi-structured output; parse failures
        // surface here and the caller falls back to the deterministic cut.
        let response = provider.complete(&request).await?;
        let indices = parse_index_response(&response)?;

        // Indices are positional against the sequence the prompt was built
        // from; the store has not mutated between building and applying.
        if !indices.is_empty() {
            remove_by_indices(&mut store.messages, &indices);
            store.metadata.prune_count += 1;
            store.refresh_metadata();
            tracing::debug!(
                removed = indices.len(),
                remaining = store.messages.len(),
                "Adaptive pruning applied"
            );
        }

        Ok(())
    }

    /// Builds the delegated pruning request
    ///
    /// Non-system messages are numbered by their absolute index and
    /// condensed to 200 characters each.
    fn build_pruning_prompt(&self, store: &ContextStore, reason: &str) -> String {
        let tokens = store.estimate_tokens();

        let mut transcript = String::from("CONVERSATION MESSAGES:\n\n");
        for (i, msg) in store.messages.iter().enumerate() {
            if msg.is_system() {
                continue;
            }

            let content = condense(&msg.content, SUMMARY_CONTENT_LENGTH);
            transcript.push_str(&format!("[{}] {}: {}\n\n", i, msg.role, content));
        }

        format!(
            "You are helping manage a conversation context that has grown too large.\n\
             \n\
             CONTEXT PRUNING REQUIRED:\n\
             Reason: {reason}\n\
             \n\
             Current state:\n\
             - Total messages: {count}\n\
             - Estimated tokens: {tokens}\n\
             - Target: Reduce to ~{target_tokens} tokens ({target_messages} messages)\n\
             \n\
             {transcript}\n\
             Your task: Analyze the conversation and identify exchanges (user question + \
             assistant response pairs) that are:\n\
             1. Least relevant to ongoing work\n\
             2. One-off questions that were fully resolved\n\
             3. Outdated information that's been superseded\n\
             4. Redundant or repetitive\n\
             \n\
             IMPORTANT RULES:\n\
             - Always preserve the last 4 messages (most recent 2 exchanges)\n\
             - Preserve messages containing code examples (with triple backticks)\n\
             - Preserve messages that reference project structure or analysis results\n\
             - Return ONLY a JSON array of message indices to remove\n\
             \n\
             Example response format:\n\
             [0, 1, 4, 5, 8, 9]\n\
             \n\
             Respond with ONLY the JSON array, no other text.",
            reason = reason,
            count = store.messages.len(),
            tokens = tokens,
            target_tokens = self.limits.target_tokens,
            target_messages = self.limits.target_messages,
            transcript = transcript,
        )
    }

    /// Cuts the oldest non-system messages down to the target count
    ///
    /// No-op when already at or below the target. The contiguous run of
    /// leading system messages is never counted toward removal, and the 4
    /// most recent messages always survive.
    pub fn prune_deterministic(&self, store: &mut ContextStore) {
        let count = store.messages.len();
        if count <= self.limits.target_messages {
            return;
        }

        let mut excess = count - self.limits.target_messages;
        let removable = count.saturating_sub(PRESERVED_RECENT_MESSAGES);
        if excess > removable {
            excess = removable;
        }
        if excess == 0 {
            return;
        }

        let lead = store
            .messages
            .iter()
            .take_while(|msg| msg.is_system())
            .count();
        let cut_end = (lead + excess).min(count);
        store.messages.drain(lead..cut_end);

        store.metadata.prune_count += 1;
        store.refresh_metadata();

        tracing::debug!(
            removed = cut_end - lead,
            remaining = store.messages.len(),
            "Deterministic pruning applied"
        );
    }

    /// Advisory predicate: should this message survive pruning?
    ///
    /// Used by the adaptive strategy's hinting and by tests; the
    /// deterministic path only hard-enforces the last-4 rule.
    pub fn should_preserve(&self, store: &ContextStore, index: usize) -> bool {
        if index + PRESERVED_RECENT_MESSAGES >= store.messages.len() {
            return true;
        }

        let Some(msg) = store.messages.get(index) else {
            return false;
        };

        if msg.content.contains("```") {
            return true;
        }

        let content = msg.content.to_lowercase();
        PRESERVE_KEYWORDS
            .iter()
            .any(|keyword| content.contains(keyword))
    }
}

/// Parses a delegated pruning response into message indices
///
/// Accepts a bare JSON array of non-negative integers, optionally wrapped
/// in a markdown code fence with surrounding whitespace. Anything else is
/// a parse failure.
pub fn parse_index_response(response: &str) -> Result<Vec<usize>> {
    let mut cleaned = response.trim();
    cleaned = cleaned.strip_prefix("```json").unwrap_or(cleaned);
    cleaned = cleaned.strip_prefix("```").unwrap_or(cleaned);
    cleaned = cleaned.strip_suffix("```").unwrap_or(cleaned);
    cleaned = cleaned.trim();

    serde_json::from_str(cleaned).map_err(|e| {
        ConfabError::Pruning(format!("failed to parse index array: {}", e)).into()
    })
}

/// Removes messages at the given positions, preserving order
///
/// Out-of-range indices are ignored.
fn remove_by_indices(messages: &mut Vec<Message>, indices: &[usize]) {
    let to_remove: HashSet<usize> = indices.iter().copied().collect();

    let mut index = 0;
    messages.retain(|_| {
        let keep = !to_remove.contains(&index);
        index += 1;
        keep
    });
}

/// Condenses content to at most `max_len` bytes on a char boundary
fn condense(content: &str, max_len: usize) -> String {
    if content.len() <= max_len {
        return content.to_string();
    }

    let mut end = max_len;
    while !content.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &content[..end])
}
