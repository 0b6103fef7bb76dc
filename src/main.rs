//! Confab - context-aware conversational assistant CLI
//!
//! Main entry point. Fatal errors terminate with a distinguishing exit
//! code per category: configuration errors exit 2, context initialization
//! errors exit 3, query and command failures exit 1.

use std::path::PathBuf;
use std::process::ExitCode;

use colored::Colorize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use confab::cli::{Cli, Commands};
use confab::commands;
use confab::config::Config;
use confab::context::Manager;

/// Exit code for query and command failures
const EXIT_QUERY: u8 = 1;
/// Exit code for configuration errors
const EXIT_CONFIG: u8 = 2;
/// Exit code for context initialization errors
const EXIT_INIT: u8 = 3;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_args();
    init_tracing(cli.verbose);

    // Load and validate configuration before any store is touched
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            print_error(&format!("Failed to load configuration: {:#}", e));
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    if let Err(e) = config.validate() {
        print_error(&format!("{:#}", e));
        return ExitCode::from(EXIT_CONFIG);
    }

    // The context key is derived once here at the boundary and threaded
    // through; nothing below reads the working directory ambiently.
    let directory = match resolve_directory(cli.directory) {
        Ok(directory) => directory,
        Err(e) => {
            print_error(&format!("Failed to resolve directory: {:#}", e));
            return ExitCode::from(EXIT_INIT);
        }
    };

    let mut manager = match Manager::new(config, directory) {
        Ok(manager) => manager,
        Err(e) => {
            print_error(&format!("Failed to initialize context: {:#}", e));
            return ExitCode::from(EXIT_INIT);
        }
    };

    match cli.command {
        Commands::Ask { analyze, query } => {
            let query = query.join(" ");
            if let Err(e) = commands::ask::run(&mut manager, analyze, &query).await {
                print_error(&format!("{:#}", e));
                return ExitCode::from(EXIT_QUERY);
            }
        }
        Commands::Reset => {
            if let Err(e) = commands::reset::run(&mut manager) {
                print_error(&format!("Failed to reset context: {:#}", e));
                return ExitCode::from(EXIT_INIT);
            }
        }
        Commands::Info => {
            commands::info::run(&manager);
        }
    }

    ExitCode::SUCCESS
}

/// Resolves the context directory from the CLI override or the cwd
fn resolve_directory(override_dir: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    let directory = match override_dir {
        Some(directory) => directory,
        None => std::env::current_dir()?,
    };
    Ok(directory.canonicalize()?)
}

/// Prints a fatal error to the diagnostic stream
fn print_error(message: &str) {
    eprintln!("{} {}", "Error:".red().bold(), message);
}

/// Initialize tracing subscriber with environment filter
fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "confab=debug" } else { "confab=info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
