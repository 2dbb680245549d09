//! Append-only CSV report with one row per finished job.
//!
//! The header row is written only when the report file is empty, so any
//! number of runs can append to the same file.

use std::{
    fs::{self, File, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
    time::Duration,
};

use tracing::{debug, instrument};

use crate::{error::ReportError, graph::GraphMetrics};

/// Marker written in place of values a failed job could not produce.
pub const ERR_MARKER: &str = "Err";

const COLUMNS: [&str; 8] = [
    "filename",
    "n",
    "k",
    "G(initial) = (V, E)",
    "G(solution) = (V, E)",
    "Components(initial)",
    "Components(solution)",
    "Δ",
];

/// How a reported job ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordResult {
    /// The solver finished and its output was reconstructed.
    Solved {
        /// Solver wall-clock time.
        elapsed: Duration,
        /// Objective value printed by the solver.
        objective: String,
        /// Metrics of the reconstructed solution.
        solution: GraphMetrics,
    },
    /// The job failed; solution columns carry [`ERR_MARKER`].
    Failed,
}

/// One report row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JobRecord {
    name: String,
    initial: Option<GraphMetrics>,
    result: RecordResult,
}

impl JobRecord {
    /// Row for a job that solved successfully.
    #[must_use]
    pub fn solved(
        name: impl Into<String>,
        initial: GraphMetrics,
        elapsed: Duration,
        objective: impl Into<String>,
        solution: GraphMetrics,
    ) -> Self {
        Self {
            name: name.into(),
            initial: Some(initial),
            result: RecordResult::Solved {
                elapsed,
                objective: objective.into(),
                solution,
            },
        }
    }

    /// Row for a failed job; `initial` is absent when the input was rejected.
    #[must_use]
    pub fn failed(name: impl Into<String>, initial: Option<GraphMetrics>) -> Self {
        Self {
            name: name.into(),
            initial,
            result: RecordResult::Failed,
        }
    }

    /// Job name in the `filename` column.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Result carried by this row.
    #[must_use]
    pub const fn result(&self) -> &RecordResult {
        &self.result
    }

    /// The header row, newline-terminated.
    #[must_use]
    pub fn csv_header() -> String {
        join_row(COLUMNS.iter().map(|column| (*column).to_owned()))
    }

    /// This record as a newline-terminated CSV row.
    ///
    /// # Examples
    /// ```
    /// use std::time::Duration;
    /// use editbench_core::{GraphMetrics, report::JobRecord};
    ///
    /// let initial = GraphMetrics { vertices: 4, edges: 3, components: 1 };
    /// let solution = GraphMetrics { vertices: 4, edges: 4, components: 2 };
    /// let row = JobRecord::solved("g", initial, Duration::from_millis(1500), "2", solution)
    ///     .to_csv_row();
    /// assert_eq!(row, "g,1.500,2,\"G = (4, 3)\",\"G = (4, 4)\",1,2,1\n");
    /// ```
    #[must_use]
    pub fn to_csv_row(&self) -> String {
        let err = || ERR_MARKER.to_owned();
        let initial_shape = self.initial.map_or_else(err, |metrics| metrics.shape());
        let initial_components = self
            .initial
            .map_or_else(err, |metrics| metrics.components.to_string());
        let fields = match &self.result {
            RecordResult::Solved {
                elapsed,
                objective,
                solution,
            } => [
                self.name.clone(),
                format!("{:.3}", elapsed.as_secs_f64()),
                objective.clone(),
                initial_shape,
                solution.shape(),
                initial_components,
                solution.components.to_string(),
                self.initial
                    .map_or_else(err, |metrics| metrics.edge_distance(solution).to_string()),
            ],
            RecordResult::Failed => [
                self.name.clone(),
                err(),
                err(),
                initial_shape,
                err(),
                initial_components,
                err(),
                err(),
            ],
        };
        join_row(fields)
    }
}

fn join_row(fields: impl IntoIterator<Item = String>) -> String {
    let mut row = fields
        .into_iter()
        .map(|field| quote(&field))
        .collect::<Vec<_>>()
        .join(",");
    row.push('\n');
    row
}

fn quote(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_owned()
    }
}

/// Exclusive append handle on the report file for one run.
#[derive(Debug)]
pub struct ReportWriter {
    path: PathBuf,
    file: File,
}

impl ReportWriter {
    /// Opens `path` for appending, writing the header if the file is empty.
    ///
    /// # Errors
    /// Returns [`ReportError::Io`] if the file cannot be created, inspected,
    /// or written.
    pub fn open(path: &Path) -> Result<Self, ReportError> {
        let wrap = |source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(wrap)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(wrap)?;
        if file.metadata().map_err(wrap)?.len() == 0 {
            file.write_all(JobRecord::csv_header().as_bytes())
                .map_err(wrap)?;
            debug!(path = %path.display(), "report header written");
        }
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    /// Report file location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends `record` and flushes it before returning.
    ///
    /// # Errors
    /// Returns [`ReportError::Io`] if the row cannot be written.
    #[instrument(name = "report.append", err, skip(self, record), fields(job = record.name()))]
    pub fn append(&mut self, record: &JobRecord) -> Result<(), ReportError> {
        let wrap = |source| ReportError::Io {
            path: self.path.clone(),
            source,
        };
        self.file
            .write_all(record.to_csv_row().as_bytes())
            .map_err(wrap)?;
        self.file.flush().map_err(wrap)
    }
}
