//! The `info` command: show context metadata for the directory

use colored::Colorize;

use crate::context::Manager;

/// Prints human-readable context information
///
/// The pruning advisory, when present, is highlighted on its own line.
pub fn run(manager: &Manager) {
    for line in manager.info().lines() {
        if line.starts_with("Warning:") {
            println!("{}", line.yellow());
        } else {
            println!("{}", line);
        }
    }
}
