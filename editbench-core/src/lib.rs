//! Editbench core library.
//!
//! Batch harness for cluster-editing experiments: discovers graph inputs,
//! converts them to the solver's input form, runs the external solver under a
//! time budget, rebuilds the solution graph, and appends one CSV row per job.

mod artifacts;
mod error;
mod graph;

pub mod canonical;
pub mod format;
pub mod harness;
pub mod reconstruct;
pub mod report;
pub mod solver;

pub use crate::{
    artifacts::JobArtifacts,
    error::{
        ConvertError, ConvertErrorCode, HarnessError, HarnessErrorCode, ParseError,
        ParseErrorCode, ReconstructError, ReconstructErrorCode, ReportError, ReportErrorCode,
        SolveError, SolveErrorCode,
    },
    format::{GraphDescriptor, InputFormat},
    graph::{Edge, Graph, GraphMetrics, VertexId},
    harness::{Harness, HarnessConfig, HarnessConfigBuilder, JobState, RunSummary},
};
