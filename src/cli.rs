//! Command-line interface definition for Confab
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for querying, resetting, and inspecting the
//! per-directory conversation context.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Confab - context-aware conversational assistant
///
/// Ask questions about the project in the current directory; the
/// conversation context persists between invocations and is pruned
/// automatically as it grows.
#[derive(Parser, Debug, Clone)]
#[command(name = "confab")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Directory whose context to use (defaults to the current directory)
    #[arg(short, long, global = true)]
    pub directory: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Confab
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Ask a question with the directory's conversation context
    Ask {
        /// Analyze the directory structure before responding
        #[arg(short, long)]
        analyze: bool,

        /// The question to ask
        #[arg(required = true)]
        query: Vec<String>,
    },

    /// Clear the conversation context for the directory
    Reset,

    /// Show context information for the directory
    Info,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
