//! Subcommand implementations.

pub mod canonicalize;
pub mod config;
pub mod detect;
pub mod providers;
pub mod treat;
