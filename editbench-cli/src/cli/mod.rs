//! Command-line interface for the editbench harness.
//!
//! `editbench run` processes every graph under the input directory and prints
//! a per-outcome summary.

mod commands;

pub use commands::{Cli, CliError, Command, ExecutionSummary, RunCommand, render_summary, run_cli};

#[cfg(test)]
mod tests;
