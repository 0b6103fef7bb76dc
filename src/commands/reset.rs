//! The `reset` command: clear the directory's conversation context

use crate::context::Manager;
use crate::error::Result;

/// Clears messages and analysis for the directory's context
///
/// The cumulative prune counter survives the reset.
pub fn run(manager: &mut Manager) -> Result<()> {
    manager.reset()?;
    println!("Context reset successfully");
    Ok(())
}
