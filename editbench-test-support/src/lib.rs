//! Shared test utilities used across editbench crates.

pub mod solver;
pub mod tracing;
