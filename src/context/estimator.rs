//! Token estimation for conversation context
//!
//! Pure functions mapping store content to an approximate token count.
//! Message content uses a 4:1 character-to-token ratio (a coarse
//! approximation, not a tokenizer). The analysis cache is deliberately
//! estimated at a denser 3.5:1 ratio plus a small per-config-file overhead;
//! the pruning thresholds were calibrated against this asymmetry, so both
//! ratios are load-bearing.

use crate::context::store::{AnalysisCache, Message};

/// Tokens charged per detected config filename in the analysis cache
const CONFIG_FILE_OVERHEAD: usize = 10;

/// Estimates the token count of a sequence of messages
///
/// Each message contributes `content.len() / 4` tokens.
pub fn estimate_messages(messages: &[Message]) -> usize {
    messages.iter().map(|msg| msg.content.len() / 4).sum()
}

/// Estimates the token count of a cached directory analysis
///
/// The file tree and README excerpt are charged at a 3.5:1 ratio, plus a
/// fixed overhead per detected config filename.
pub fn estimate_analysis_cache(cache: &AnalysisCache) -> usize {
    let text_len = cache.file_tree.len()
        + cache
            .readme_content
            .as_deref()
            .map_or(0, |readme| readme.len());

    (text_len as f64 / 3.5) as usize + cache.primary_configs.len() * CONFIG_FILE_OVERHEAD
}

/// Estimates the total token count of a store's content
///
/// # Examples
///
/// ```
/// use confab::context::estimator::estimate_store;
/// use confab::context::store::Message;
///
/// let messages = vec![Message::new("user", "What does this project do?")];
/// assert_eq!(estimate_store(&messages, None), 6);
/// ```
pub fn estimate_store(messages: &[Message], cache: Option<&AnalysisCache>) -> usize {
    estimate_messages(messages) + cache.map_or(0, estimate_analysis_cache)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(tree: &str, readme: Option<&str>, configs: &[&str]) -> AnalysisCache {
        AnalysisCache {
            file_tree: tree.to_string(),
            readme_content: readme.map(str::to_string),
            primary_configs: configs.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_empty_messages_estimate_zero() {
        assert_eq!(estimate_messages(&[]), 0);
    }

    #[test]
    fn test_message_ratio_is_four_to_one() {
        let messages = vec![Message::new("user", "a".repeat(400))];
        assert_eq!(estimate_messages(&messages), 100);
    }

    #[test]
    fn test_message_estimate_floors() {
        let messages = vec![Message::new("user", "abc")];
        assert_eq!(estimate_messages(&messages), 0);
    }

    #[test]
    fn test_messages_sum_across_roles() {
        let messages = vec![
            Message::new("user", "x".repeat(40)),
            Message::new("assistant", "y".repeat(80)),
        ];
        assert_eq!(estimate_messages(&messages), 30);
    }

    #[test]
    fn test_cache_ratio_is_denser_than_message_ratio() {
        let text = "z".repeat(3500);
        let as_message = estimate_messages(&[Message::new("user", text.clone())]);
        let as_cache = estimate_analysis_cache(&cache(&text, None, &[]));
        assert_eq!(as_cache, 1000);
        assert!(as_cache > as_message);
    }

    #[test]
    fn test_cache_includes_readme_and_config_overhead() {
        let c = cache(&"t".repeat(350), Some(&"r".repeat(350)), &["go.mod", "Makefile"]);
        assert_eq!(estimate_analysis_cache(&c), 200 + 2 * CONFIG_FILE_OVERHEAD);
    }

    #[test]
    fn test_store_estimate_combines_messages_and_cache() {
        let messages = vec![Message::new("user", "m".repeat(400))];
        let c = cache(&"t".repeat(3500), None, &[]);
        assert_eq!(estimate_store(&messages, None), 100);
        assert_eq!(estimate_store(&messages, Some(&c)), 1100);
    }
}
