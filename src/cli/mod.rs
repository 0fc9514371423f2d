//! Command-line interface for phishguard.
//!
//! Provides the training, prediction, and store-seeding commands.

mod commands;

pub use commands::{parse_cli, run_with_cli, Cli, Commands};
