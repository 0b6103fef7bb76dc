//! Confab - context-aware conversational assistant CLI
//!
//! This library provides the core functionality for Confab: persistent
//! per-directory conversation context with an automatic pruning engine
//! that keeps the context within a bounded size budget.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `context`: conversation store, size estimation, pruning policy,
//!   emergency guard, directory analysis, and the per-query manager
//! - `providers`: generation-service abstraction and the OpenAI-compatible
//!   implementation
//! - `prompts`: system prompt construction
//! - `storage`: JSON persistence of context stores keyed by directory
//! - `config`: `.env`-style configuration loading and validation
//! - `error`: error types and result alias
//! - `cli`: command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use confab::config::Config;
//! use confab::context::Manager;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     config.validate()?;
//!
//!     let mut manager = Manager::new(config, std::env::current_dir()?)?;
//!     let response = manager.query("how do I run the tests?").await?;
//!     println!("{}", response);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod prompts;
pub mod providers;
pub mod storage;

// Re-export commonly used types
pub use config::Config;
pub use context::{ContextStore, Manager, Pruner, PruningLimits};
pub use error::{ConfabError, Result};
