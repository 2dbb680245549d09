//! Recursive input discovery and stale-artifact sweeps.

use std::{
    fs,
    path::{Path, PathBuf},
};

use glob::{Pattern, glob};
use tracing::{debug, warn};

use crate::{error::HarnessError, format::InputFormat};

/// Suffix of leftovers from an earlier toolchain, deleted during discovery.
pub const STALE_SUFFIX: &str = "td";

/// A file whose suffix names a supported format.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
    /// File path.
    pub path: PathBuf,
    /// Format selected from the suffix.
    pub format: InputFormat,
}

/// Scans `input_dir` recursively, deleting stale files and returning
/// convertible inputs in scan order.
///
/// # Errors
/// Returns [`HarnessError::UnreadableInputDir`] when the directory cannot be
/// listed and [`HarnessError::InvalidPattern`] when its path cannot be turned
/// into a glob pattern.
pub fn discover(input_dir: &Path) -> Result<Vec<Candidate>, HarnessError> {
    fs::read_dir(input_dir).map_err(|source| HarnessError::UnreadableInputDir {
        path: input_dir.to_path_buf(),
        source,
    })?;

    let mut candidates = Vec::new();
    for path in matching_files(input_dir, "*.*")? {
        if path.extension().is_some_and(|ext| ext == STALE_SUFFIX) {
            remove_logged(&path);
            continue;
        }
        if let Some(format) = InputFormat::from_path(&path) {
            candidates.push(Candidate { path, format });
        }
    }
    debug!(dir = %input_dir.display(), count = candidates.len(), "discovery finished");
    Ok(candidates)
}

/// Deletes every file under `dir` ending in `.<suffix>`, returning how many
/// were removed.
///
/// # Errors
/// Returns [`HarnessError::InvalidPattern`] when `dir` cannot be turned into a
/// glob pattern.
pub fn sweep(dir: &Path, suffix: &str) -> Result<usize, HarnessError> {
    let mut removed = 0;
    for path in matching_files(dir, &format!("*.{suffix}"))? {
        if remove_logged(&path) {
            removed += 1;
        }
    }
    Ok(removed)
}

fn matching_files(dir: &Path, file_pattern: &str) -> Result<Vec<PathBuf>, HarnessError> {
    let root = Pattern::escape(&dir.to_string_lossy());
    let pattern = format!("{root}/**/{file_pattern}");
    let entries = glob(&pattern).map_err(|source| HarnessError::InvalidPattern {
        pattern: pattern.clone(),
        source,
    })?;
    let mut files = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) if path.is_file() => files.push(path),
            Ok(_) => {}
            Err(err) => warn!(path = %err.path().display(), error = %err.error(), "skipping unreadable entry"),
        }
    }
    Ok(files)
}

fn remove_logged(path: &Path) -> bool {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!(path = %path.display(), "removed");
            true
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "failed to remove file");
            false
        }
    }
}
