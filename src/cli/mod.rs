//! Command-line interface for prompt-forge.
//!
//! Provides commands for scoring candidate sets, building manifests,
//! extracting the winning prompts, running test cases and preparing
//! datasets.

mod commands;

pub use commands::{parse_cli, run, run_with_cli, Cli, Commands};
