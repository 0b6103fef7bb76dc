//! The `ask` command: query the assistant with conversation context

use colored::Colorize;

use crate::context::Manager;
use crate::error::Result;

/// Runs one query against the directory's conversation context
///
/// With `analyze` set, the directory is analyzed first and the result
/// cached into the context; an analysis failure is a warning, not a reason
/// to drop the query.
pub async fn run(manager: &mut Manager, analyze: bool, query: &str) -> Result<()> {
    if analyze {
        eprintln!("Analyzing directory structure...");
        match manager.analyze() {
            Ok(()) => eprintln!("Analysis complete."),
            Err(e) => eprintln!("{} Analysis failed: {:#}", "Warning:".yellow(), e),
        }
    }

    let response = manager.query(query).await?;
    println!("{}", response);

    Ok(())
}
