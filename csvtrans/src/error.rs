//! Error types for the csvtrans row pipeline.
//!
//! - [`Error`] - pipeline and file runner failures
//! - [`Phase`] - which step of a run failed
//! - [`MatrixError`] - column matrix loading and execution errors
//! - [`ConfigError`] - environment configuration errors
//!
//! Every run failure is fatal: nothing is retried and nothing already written
//! is rolled back.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Boxed cause returned by transformers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

// =============================================================================
// Pipeline Errors
// =============================================================================

/// Errors returned by [`crate::run`] and [`crate::run_files`].
#[derive(Debug, Error)]
pub enum Error {
    /// Input and output name the same file.
    #[error("input and output must be different files: {}", .path.display())]
    SamePath { path: PathBuf },

    /// Input file could not be opened.
    #[error("error opening input {}: {source}", .path.display())]
    OpenInput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Output file could not be created.
    #[error("error opening output {} for write: {source}", .path.display())]
    OpenOutput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Malformed row or I/O failure while reading.
    #[error("error reading row at index {index}: {source}")]
    Read {
        index: usize,
        #[source]
        source: csv::Error,
    },

    /// The transformer rejected the row.
    #[error("error transforming row at index {index}: {source}")]
    Transform {
        index: usize,
        #[source]
        source: BoxError,
    },

    /// The sink rejected the row.
    #[error("error writing row at index {index}: {source}")]
    Write {
        index: usize,
        #[source]
        source: csv::Error,
    },

    /// Final flush of the sink failed.
    #[error("error flushing output: {0}")]
    Flush(#[source] io::Error),
}

/// The step of a run where an [`Error`] originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    SameFile,
    OpeningInput,
    OpeningOutput,
    Reading,
    Transforming,
    Writing,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::SameFile => "same-file configuration",
            Phase::OpeningInput => "opening input",
            Phase::OpeningOutput => "opening output",
            Phase::Reading => "reading",
            Phase::Transforming => "transforming",
            Phase::Writing => "writing",
        };
        f.write_str(name)
    }
}

impl Error {
    /// Step of the run that failed.
    pub fn phase(&self) -> Phase {
        match self {
            Error::SamePath { .. } => Phase::SameFile,
            Error::OpenInput { .. } => Phase::OpeningInput,
            Error::OpenOutput { .. } => Phase::OpeningOutput,
            Error::Read { .. } => Phase::Reading,
            Error::Transform { .. } => Phase::Transforming,
            Error::Write { .. } | Error::Flush(_) => Phase::Writing,
        }
    }

    /// Zero-based index of the row being processed, if the failure is tied to one.
    pub fn row_index(&self) -> Option<usize> {
        match self {
            Error::Read { index, .. }
            | Error::Transform { index, .. }
            | Error::Write { index, .. } => Some(*index),
            _ => None,
        }
    }

    /// True for the same-file configuration error, detected before any I/O.
    pub fn is_config(&self) -> bool {
        matches!(self, Error::SamePath { .. })
    }
}

// =============================================================================
// Column Matrix Errors
// =============================================================================

/// Errors while loading, compiling or executing a column matrix.
#[derive(Debug, Error)]
pub enum MatrixError {
    /// Structurally invalid matrix.
    #[error("Invalid column matrix: {0}")]
    InvalidMatrix(String),

    /// Header row lacks columns the matrix reads.
    #[error("Missing source columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// A `replace` operation carries a bad pattern.
    #[error("Invalid pattern in column '{column}': {source}")]
    InvalidPattern {
        column: String,
        #[source]
        source: regex::Error,
    },

    /// Matrix file could not be read.
    #[error("Failed to read matrix: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error.
    #[error("Matrix JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors reading settings from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Unrecognized log level name.
    #[error("Invalid value for {var}: '{value}'")]
    InvalidValue { var: &'static str, value: String },
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Result type for column matrix operations.
pub type MatrixResult<T> = std::result::Result<T, MatrixError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_and_index() {
        let err = Error::Transform {
            index: 7,
            source: "bad number".into(),
        };
        assert_eq!(err.phase(), Phase::Transforming);
        assert_eq!(err.row_index(), Some(7));
        let msg = err.to_string();
        assert!(msg.contains("transforming"));
        assert!(msg.contains("7"));
        assert!(msg.contains("bad number"));
    }

    #[test]
    fn test_same_path_is_config() {
        let err = Error::SamePath {
            path: PathBuf::from("data.csv"),
        };
        assert!(err.is_config());
        assert_eq!(err.phase().to_string(), "same-file configuration");
        assert_eq!(err.row_index(), None);
    }

    #[test]
    fn test_flush_counts_as_writing() {
        let err = Error::Flush(io::Error::new(io::ErrorKind::BrokenPipe, "closed"));
        assert_eq!(err.phase(), Phase::Writing);
        assert_eq!(err.row_index(), None);
    }

    #[test]
    fn test_missing_columns_format() {
        let err = MatrixError::MissingColumns(vec!["Title".into(), "IPI".into()]);
        assert_eq!(err.to_string(), "Missing source columns: Title, IPI");
    }
}
