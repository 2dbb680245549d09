//! Support library for the editbench CLI binary.
//!
//! Exposes the command and logging modules so tests can drive a run without
//! spawning the binary.

pub mod cli;
pub mod logging;
