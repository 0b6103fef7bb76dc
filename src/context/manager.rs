//! Conversation manager: the per-query control loop
//!
//! The manager owns exactly one context store for the duration of a call
//! and is the only component that talks to the generation service and the
//! persistence layer. Each query runs the emergency guard, appends the user
//! turn, assembles the outbound request with a fresh system preamble, calls
//! the provider, appends the response, runs the guard and the normal prune
//! check, and persists. Guard and pruning failures are warnings; provider
//! and persistence failures are fatal to the query.

use std::path::PathBuf;

use anyhow::Context as _;

use crate::config::Config;
use crate::error::Result;
use crate::context::analyzer;
use crate::context::guard::EmergencyGuard;
use crate::context::limits::PruningLimits;
use crate::context::pruner::Pruner;
use crate::context::store::ContextStore;
use crate::prompts;
use crate::providers::{OpenAiProvider, Provider};
use crate::storage::ContextStorage;

/// Conversation manager for one directory's context
pub struct Manager {
    store: ContextStore,
    config: Config,
    provider: Box<dyn Provider>,
    storage: ContextStorage,
    limits: PruningLimits,
    guard: EmergencyGuard,
}

impl Manager {
    /// Creates a manager for the given directory using default storage
    ///
    /// Loads the directory's existing context, or starts fresh when none
    /// exists yet.
    pub fn new(config: Config, directory: PathBuf) -> Result<Self> {
        let storage = ContextStorage::new()?;
        Self::with_storage(config, directory, storage)
    }

    /// Creates a manager backed by the given storage
    ///
    /// Primarily useful for tests that point storage at a temporary
    /// directory.
    pub fn with_storage(
        config: Config,
        directory: PathBuf,
        storage: ContextStorage,
    ) -> Result<Self> {
        let store = storage
            .load(&directory)
            .context("failed to load context")?;
        let provider = Box::new(OpenAiProvider::new(&config)?);
        let limits = PruningLimits::default();

        Ok(Self {
            store,
            config,
            provider,
            storage,
            limits,
            guard: EmergencyGuard::new(limits),
        })
    }

    /// Sends a query with conversation context and returns the response
    ///
    /// # Errors
    ///
    /// Returns an error when the provider call fails (the store is not
    /// persisted with the partial exchange) or when the final persist
    /// fails (the user must know the exchange was not saved).
    pub async fn query(&mut self, user_query: &str) -> Result<String> {
        self.guard.enforce(&mut self.store);

        self.store.add_message("user", user_query);

        let messages = prompts::build_messages(
            &self.store.directory_display(),
            &self.config.os,
            &self.store.messages,
            self.store.analysis_cache.as_ref(),
        );

        let response = self
            .provider
            .complete(&messages)
            .await
            .context("API request failed")?;

        self.store.add_message("assistant", &response);

        self.guard.enforce(&mut self.store);

        if let Err(e) = self.check_and_prune().await {
            tracing::warn!(error = %e, "Context pruning failed");
        }

        self.storage
            .save(&mut self.store)
            .context("failed to save context")?;

        Ok(response)
    }

    /// Checks limits and prunes when needed
    async fn check_and_prune(&mut self) -> Result<()> {
        let provider = self.provider.as_ref();
        let pruner = Pruner::new(Some(provider), self.limits);

        let Some(reason) = pruner.should_prune(&self.store) else {
            return Ok(());
        };

        tracing::info!(%reason, "Context pruning triggered");
        pruner.prune(&mut self.store).await?;
        tracing::info!(
            messages = self.store.messages.len(),
            tokens = self.store.estimate_tokens(),
            "Context pruned"
        );

        Ok(())
    }

    /// Clears the conversation context, preserving the prune counter
    pub fn reset(&mut self) -> Result<()> {
        self.store.reset();
        self.storage
            .save(&mut self.store)
            .context("failed to save reset context")?;
        Ok(())
    }

    /// Analyzes the directory and caches the result
    pub fn analyze(&mut self) -> Result<()> {
        analyzer::analyze_into(&mut self.store).context("analysis failed")?;
        self.storage
            .save(&mut self.store)
            .context("failed to save analysis")?;
        Ok(())
    }

    /// Returns human-readable information about the current context
    pub fn info(&self) -> String {
        let mut info = format!("Context for {}\n", self.store.directory_display());
        info.push_str(&format!("Messages: {}\n", self.store.metadata.total_messages));
        info.push_str(&format!(
            "Estimated tokens: {}\n",
            self.store.metadata.total_tokens_estimate
        ));
        info.push_str(&format!("Prune count: {}\n", self.store.metadata.prune_count));

        if let Some(last_analysis) = self.store.last_analysis_at {
            info.push_str(&format!(
                "Last analysis: {}\n",
                last_analysis.format("%Y-%m-%d %H:%M:%S")
            ));
        }

        info.push_str(&format!(
            "Last updated: {}\n",
            self.store.updated_at.format("%Y-%m-%d %H:%M:%S")
        ));

        if let Some(reason) = Pruner::new(None, self.limits).should_prune(&self.store) {
            info.push_str(&format!(
                "\nWarning: Pruning will be triggered soon: {}\n",
                reason
            ));
        }

        info
    }

    /// Returns a view of the managed store
    pub fn store(&self) -> &ContextStore {
        &self.store
    }
}
