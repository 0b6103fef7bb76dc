//! Emergency guard for catastrophically oversized context
//!
//! A second safety net, independent of the normal pruning policy, checked
//! against the emergency tier (1.5x the hard tier) immediately before the
//! user message is appended and again after the assistant response lands.
//! Recovery is two-step: first shed a bloated analysis cache, which is
//! cheaper and less destructive to conversational continuity than dropping
//! messages, then cut messages deterministically if the store is still
//! over. The adaptive strategy is never used here.

use crate::context::estimator;
use crate::context::limits::PruningLimits;
use crate::context::pruner::Pruner;
use crate::context::store::ContextStore;

/// What the emergency guard did during one enforcement pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmergencyOutcome {
    /// The analysis cache was discarded
    pub cache_cleared: bool,
    /// Messages were cut deterministically
    pub messages_pruned: bool,
}

impl EmergencyOutcome {
    /// Returns true if the guard took any action
    pub fn acted(&self) -> bool {
        self.cache_cleared || self.messages_pruned
    }
}

/// Emergency guard over one context store
#[derive(Debug, Clone, Copy)]
pub struct EmergencyGuard {
    limits: PruningLimits,
}

impl EmergencyGuard {
    /// Creates a guard with the given limits
    pub fn new(limits: PruningLimits) -> Self {
        Self { limits }
    }

    /// Checks whether the store exceeds an emergency ceiling
    pub fn triggered(&self, store: &ContextStore) -> bool {
        store.estimate_tokens() > self.limits.emergency_tokens
            || store.messages.len() > self.limits.emergency_messages
    }

    /// Brings an oversized store back under control
    ///
    /// Best effort: the guard logs what it sheds and never fails the
    /// caller's query.
    pub fn enforce(&self, store: &mut ContextStore) -> EmergencyOutcome {
        let mut outcome = EmergencyOutcome::default();
        if !self.triggered(store) {
            return outcome;
        }

        tracing::warn!(
            messages = store.messages.len(),
            tokens = store.estimate_tokens(),
            "Context exceeds emergency limits"
        );

        if let Some(cache) = &store.analysis_cache {
            let cache_tokens = estimator::estimate_analysis_cache(cache);
            let total_tokens = store.estimate_tokens();
            if cache_tokens * 2 > total_tokens {
                store.clear_analysis_cache();
                outcome.cache_cleared = true;
                tracing::warn!(
                    freed = cache_tokens,
                    "Emergency guard discarded oversized analysis cache"
                );
            }
        }

        if self.triggered(store) {
            Pruner::new(None, self.limits).prune_deterministic(store);
            outcome.messages_pruned = true;
            tracing::warn!(
                remaining = store.messages.len(),
                "Emergency guard forced deterministic pruning"
            );
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::store::AnalysisCache;

    fn guard() -> EmergencyGuard {
        EmergencyGuard::new(PruningLimits::default())
    }

    #[test]
    fn test_not_triggered_for_small_store() {
        let mut store = ContextStore::new("/test/dir");
        store.add_message("user", "Hello");

        assert!(!guard().triggered(&store));
        let outcome = guard().enforce(&mut store);
        assert!(!outcome.acted());
        assert_eq!(store.messages.len(), 1);
    }

    #[test]
    fn test_triggered_by_message_count() {
        let mut store = ContextStore::new("/test/dir");
        for i in 0..151 {
            store.add_message("user", format!("m{}", i));
        }
        assert!(guard().triggered(&store));
    }

    #[test]
    fn test_not_triggered_at_exactly_the_ceiling() {
        let mut store = ContextStore::new("/test/dir");
        for i in 0..150 {
            store.add_message("user", format!("{}", i));
        }
        assert!(!guard().triggered(&store));
    }

    #[test]
    fn test_huge_analysis_cache_is_cleared() {
        let mut store = ContextStore::new("/test/dir");
        // ~300KB of tree and ~115KB of README push the estimate far past
        // the emergency ceiling on their own
        store.set_analysis_cache(AnalysisCache {
            file_tree: "src/\n  file.rs\n  utils.rs\n".repeat(10_000),
            readme_content: Some("This is documentation.\n".repeat(5_000)),
            primary_configs: vec!["Cargo.toml".to_string(), "package.json".to_string()],
        });

        let initial_tokens = store.estimate_tokens();
        assert!(initial_tokens > 37_500);

        let outcome = guard().enforce(&mut store);

        assert!(outcome.acted());
        assert!(outcome.cache_cleared);
        assert!(!outcome.messages_pruned);
        assert!(store.analysis_cache.is_none());
        assert!(store.last_analysis_at.is_none());
        assert!(store.estimate_tokens() < initial_tokens / 2);
        assert!(store.estimate_tokens() <= 37_500);
    }

    #[test]
    fn test_cache_shedding_comes_before_message_cuts() {
        let mut store = ContextStore::new("/test/dir");
        for i in 0..20 {
            store.add_message("user", format!("message {}", i));
        }
        store.set_analysis_cache(AnalysisCache {
            file_tree: "x".repeat(200_000),
            readme_content: None,
            primary_configs: vec![],
        });

        let outcome = guard().enforce(&mut store);

        // Dropping the cache alone brings the store back under the
        // ceiling; messages survive untouched
        assert!(outcome.cache_cleared);
        assert!(!outcome.messages_pruned);
        assert_eq!(store.messages.len(), 20);
    }

    #[test]
    fn test_message_cut_when_cache_shedding_is_not_enough() {
        let mut store = ContextStore::new("/test/dir");
        for i in 0..160 {
            store.add_message("user", format!("message {}", i));
        }

        let outcome = guard().enforce(&mut store);

        assert!(!outcome.cache_cleared);
        assert!(outcome.messages_pruned);
        assert_eq!(
            store.messages.len(),
            PruningLimits::default().target_messages
        );
        assert_eq!(store.metadata.prune_count, 1);
    }

    #[test]
    fn test_small_cache_is_kept_when_messages_dominate() {
        let mut store = ContextStore::new("/test/dir");
        for _ in 0..10 {
            store.add_message("user", "y".repeat(45_000));
        }
        store.set_analysis_cache(AnalysisCache {
            file_tree: "src/\n  main.rs\n".to_string(),
            readme_content: None,
            primary_configs: vec![],
        });

        // Tokens: ~112,500 from messages, a handful from the cache
        assert!(guard().triggered(&store));
        let outcome = guard().enforce(&mut store);

        // The cache is under half the total, so messages take the cut
        assert!(!outcome.cache_cleared);
        assert!(outcome.messages_pruned);
        assert!(store.analysis_cache.is_some());
    }

    #[test]
    fn test_metadata_consistent_after_enforcement() {
        let mut store = ContextStore::new("/test/dir");
        for i in 0..160 {
            store.add_message("user", format!("message {}", i));
        }
        store.set_analysis_cache(AnalysisCache {
            file_tree: "x".repeat(300_000),
            readme_content: None,
            primary_configs: vec![],
        });

        guard().enforce(&mut store);

        assert_eq!(store.metadata.total_messages, store.messages.len());
        assert_eq!(store.metadata.total_tokens_estimate, store.estimate_tokens());
    }
}
