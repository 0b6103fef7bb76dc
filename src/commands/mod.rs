//! Command handlers for the Confab CLI

pub mod ask;
pub mod info;
pub mod reset;
