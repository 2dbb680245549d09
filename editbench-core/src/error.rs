//! Error types for the editbench core library.
//!
//! Every pipeline stage has its own error enum paired with a stable code enum
//! so diagnostics can be matched on by log consumers without parsing messages.

use std::{fmt, io, path::PathBuf, process::ExitStatus, time::Duration};

use thiserror::Error;

use crate::harness::JobState;

macro_rules! define_error_codes {
    (
        $(#[$enum_meta:meta])*
        enum $CodeTy:ident for $ErrTy:ident {
            $(
                $(#[$variant_meta:meta])*
                $CodeVariant:ident => $ErrVariant:ident
                    $( { $($pattern:tt)* } )? $( ( $($tuple:tt)* ) )? => $code:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        #[non_exhaustive]
        pub enum $CodeTy {
            $(
                $(#[$variant_meta])*
                $CodeVariant,
            )+
        }

        impl $CodeTy {
            /// Return the stable machine-readable representation of this error code.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$CodeVariant => $code,)+
                }
            }
        }

        impl fmt::Display for $CodeTy {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $ErrTy {
            #[doc = concat!(
                "Retrieve the stable [`",
                stringify!($CodeTy),
                "`] for this error."
            )]
            #[must_use]
            pub const fn code(&self) -> $CodeTy {
                match self {
                    $(
                        Self::$ErrVariant $( { $($pattern)* } )? $( ( $($tuple)* ) )?
                            => $CodeTy::$CodeVariant,
                    )+
                }
            }
        }
    };
}

/// Failure while reading a graph source file.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ParseError {
    /// The source file could not be read.
    #[error("failed to read `{path}`: {source}")]
    Io {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// No `p` metadata line was present.
    #[error("missing header: expected exactly one `p <name> <V> <E>` line")]
    MissingHeader,
    /// More than one `p` metadata line was present.
    #[error("ambiguous header: found {count} metadata lines")]
    AmbiguousHeader {
        /// Number of metadata lines encountered.
        count: usize,
    },
    /// The metadata line did not hold four tokens with numeric counts.
    #[error("malformed header on line {line}")]
    MalformedHeader {
        /// One-based line number of the header.
        line: usize,
    },
    /// A body line did not hold exactly two non-negative integers.
    #[error("malformed edge line {line}: expected two non-negative integers")]
    MalformedEdgeLine {
        /// One-based line number of the offending edge.
        line: usize,
    },
    /// The parsed graph disagrees with the declared counts.
    #[error(
        "metadata mismatch: declared {declared_vertices} vertices / {declared_edges} edges, \
         parsed {parsed_vertices} vertices / {parsed_edges} edges"
    )]
    MetadataMismatch {
        /// Vertex count declared in the header.
        declared_vertices: usize,
        /// Edge count declared in the header.
        declared_edges: usize,
        /// Vertices present in the parsed edge set.
        parsed_vertices: usize,
        /// Distinct edges present in the parsed edge set.
        parsed_edges: usize,
    },
    /// A graph6 token could not be decoded.
    #[error("invalid graph6 token on line {line}: {reason}")]
    InvalidGraph6 {
        /// One-based line number of the token.
        line: usize,
        /// Human-readable decoding failure.
        reason: &'static str,
    },
    /// The file suffix does not name a supported format.
    #[error("`{path}` does not carry a supported graph suffix")]
    UnsupportedFormat {
        /// File whose suffix was not recognised.
        path: PathBuf,
    },
}

define_error_codes! {
    /// Stable codes describing [`ParseError`] variants.
    enum ParseErrorCode for ParseError {
        /// The source file could not be read.
        Io => Io { .. } => "PARSE_IO",
        /// No metadata line was present.
        MissingHeader => MissingHeader => "PARSE_MISSING_HEADER",
        /// More than one metadata line was present.
        AmbiguousHeader => AmbiguousHeader { .. } => "PARSE_AMBIGUOUS_HEADER",
        /// The metadata line was malformed.
        MalformedHeader => MalformedHeader { .. } => "PARSE_MALFORMED_HEADER",
        /// A body line was malformed.
        MalformedEdgeLine => MalformedEdgeLine { .. } => "PARSE_MALFORMED_EDGE_LINE",
        /// The parsed graph disagrees with the declared counts.
        MetadataMismatch => MetadataMismatch { .. } => "PARSE_METADATA_MISMATCH",
        /// A graph6 token could not be decoded.
        InvalidGraph6 => InvalidGraph6 { .. } => "PARSE_INVALID_GRAPH6",
        /// The file suffix does not name a supported format.
        UnsupportedFormat => UnsupportedFormat { .. } => "PARSE_UNSUPPORTED_FORMAT",
    }
}

/// Failure while converting a source file into the solver input form.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The source file was rejected by the parser.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// The canonical file could not be written.
    #[error("failed to write `{path}`: {source}")]
    Io {
        /// Destination that could not be written.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
}

define_error_codes! {
    /// Stable codes describing [`ConvertError`] variants.
    enum ConvertErrorCode for ConvertError {
        /// The source file was rejected by the parser.
        Parse => Parse(..) => "CONVERT_PARSE",
        /// The canonical file could not be written.
        Io => Io { .. } => "CONVERT_IO",
    }
}

/// Failure while running the external solver on one input.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SolveError {
    /// The canonical input was empty and has been removed.
    #[error("canonical input `{path}` is empty")]
    EmptyInput {
        /// Removed canonical input.
        path: PathBuf,
    },
    /// The canonical input could not be inspected before launch.
    #[error("failed to inspect canonical input `{path}`: {source}")]
    Inspect {
        /// Canonical input that could not be inspected.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// The solver process could not be started.
    #[error("failed to launch solver for `{path}`: {source}")]
    Spawn {
        /// Canonical input handed to the solver.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// Waiting on or killing the solver process failed.
    #[error("failed to wait on solver process: {source}")]
    Wait {
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// The solver exceeded its time budget and was killed.
    #[error("solver exceeded the time budget after {elapsed:?}")]
    Timeout {
        /// Wall-clock time at which the process was killed.
        elapsed: Duration,
    },
    /// The operating system killed the solver, most likely for exhausting memory.
    #[error("solver was killed by the operating system (likely out of memory)")]
    ResourceExhausted,
    /// The solver exited unsuccessfully for another reason.
    #[error("solver exited unsuccessfully: {status}")]
    Failed {
        /// Exit status reported by the operating system.
        status: ExitStatus,
    },
    /// The solver's standard output could not be collected.
    #[error("failed to read solver output: {source}")]
    Output {
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
}

define_error_codes! {
    /// Stable codes describing [`SolveError`] variants.
    enum SolveErrorCode for SolveError {
        /// The canonical input was empty.
        EmptyInput => EmptyInput { .. } => "SOLVER_EMPTY_INPUT",
        /// The canonical input could not be inspected.
        Inspect => Inspect { .. } => "SOLVER_INPUT",
        /// The solver process could not be started.
        Spawn => Spawn { .. } => "SOLVER_SPAWN",
        /// Waiting on the solver failed.
        Wait => Wait { .. } => "SOLVER_WAIT",
        /// The solver exceeded its time budget.
        Timeout => Timeout { .. } => "SOLVER_TIMEOUT",
        /// The solver was killed by the operating system.
        ResourceExhausted => ResourceExhausted => "SOLVER_RESOURCE_EXHAUSTED",
        /// The solver exited unsuccessfully.
        Failed => Failed { .. } => "SOLVER_FAILED",
        /// The solver output could not be collected.
        Output => Output { .. } => "SOLVER_OUTPUT",
    }
}

/// Failure while rebuilding a solution graph from solver output.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ReconstructError {
    /// The solver output could not be read or the cluster dump written.
    #[error("failed to access `{path}`: {source}")]
    Io {
        /// Solver output or cluster dump file.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// A node block did not carry the positional field.
    #[error("node {node} lacks field {field}")]
    MissingField {
        /// Zero-based index of the node block.
        node: usize,
        /// Positional field that was absent.
        field: usize,
    },
    /// The vertex field of a node block was not a non-negative integer.
    #[error("node {node} names invalid vertex `{value}`")]
    InvalidVertex {
        /// Zero-based index of the node block.
        node: usize,
        /// Raw field contents.
        value: String,
    },
    /// A `node [` block was never closed.
    #[error("unterminated node block at byte {offset}")]
    UnterminatedNode {
        /// Byte offset of the opening bracket.
        offset: usize,
    },
}

define_error_codes! {
    /// Stable codes describing [`ReconstructError`] variants.
    enum ReconstructErrorCode for ReconstructError {
        /// The solver output could not be read.
        Io => Io { .. } => "RECONSTRUCT_IO",
        /// A node block lacked the positional field.
        MissingField => MissingField { .. } => "RECONSTRUCT_MISSING_FIELD",
        /// A vertex field was invalid.
        InvalidVertex => InvalidVertex { .. } => "RECONSTRUCT_INVALID_VERTEX",
        /// A node block was never closed.
        UnterminatedNode => UnterminatedNode { .. } => "RECONSTRUCT_UNTERMINATED_NODE",
    }
}

/// Failure while appending to the report file.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ReportError {
    /// The report file could not be opened or written.
    #[error("failed to write report `{path}`: {source}")]
    Io {
        /// Report file path.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
}

define_error_codes! {
    /// Stable codes describing [`ReportError`] variants.
    enum ReportErrorCode for ReportError {
        /// The report file could not be opened or written.
        Io => Io { .. } => "REPORT_IO",
    }
}

/// Run-fatal failure that aborts the harness before or between jobs.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum HarnessError {
    /// The solver executable does not exist.
    #[error("binary not found: `{path}`")]
    MissingBinary {
        /// Expected solver location.
        path: PathBuf,
    },
    /// The input directory could not be scanned.
    #[error("cannot read input directory `{path}`: {source}")]
    UnreadableInputDir {
        /// Directory that was scanned.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// The discovery pattern could not be built from the input directory.
    #[error("invalid discovery pattern `{pattern}`: {source}")]
    InvalidPattern {
        /// Pattern handed to the glob matcher.
        pattern: String,
        /// Underlying pattern error.
        #[source]
        source: glob::PatternError,
    },
    /// The report file could not be written.
    #[error(transparent)]
    Report(#[from] ReportError),
    /// A configuration value was out of range.
    #[error("invalid configuration: {field} must be at least 1")]
    InvalidConfig {
        /// Offending configuration field.
        field: &'static str,
    },
    /// A job was moved backwards or skipped a required state.
    #[error("job `{job}` cannot move from {from:?} to {to:?}")]
    InvalidTransition {
        /// Job name.
        job: String,
        /// State the job was in.
        from: JobState,
        /// Requested state.
        to: JobState,
    },
}

define_error_codes! {
    /// Stable codes describing [`HarnessError`] variants.
    enum HarnessErrorCode for HarnessError {
        /// The solver executable does not exist.
        MissingBinary => MissingBinary { .. } => "HARNESS_MISSING_BINARY",
        /// The input directory could not be scanned.
        UnreadableInputDir => UnreadableInputDir { .. } => "HARNESS_UNREADABLE_INPUT_DIR",
        /// The discovery pattern was invalid.
        InvalidPattern => InvalidPattern { .. } => "HARNESS_INVALID_PATTERN",
        /// The report file could not be written.
        Report => Report(..) => "HARNESS_REPORT",
        /// A configuration value was out of range.
        InvalidConfig => InvalidConfig { .. } => "HARNESS_INVALID_CONFIG",
        /// A job transition was not allowed.
        InvalidTransition => InvalidTransition { .. } => "HARNESS_INVALID_TRANSITION",
    }
}
