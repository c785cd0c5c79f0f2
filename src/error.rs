//! Error types for fitport
//!
//! Two severities exist. [`ConvertError`] stops the whole run before (or while)
//! writing output. [`SourceError`] is scoped to a single input file: the file is
//! skipped with a warning and every other source still contributes.

use chrono::NaiveDate;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors that halt a conversion run
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Fitbit directory not found: {0}")]
    InputDirNotFound(PathBuf),

    #[error("Expected subdirectory not found: {0}")]
    MissingSubdirectory(PathBuf),

    #[error("Invalid {bound} date '{value}'. Use YYYY-MM-DD format.")]
    InvalidDate { bound: &'static str, value: String },

    #[error("Invalid date window: start {start} is after end {end}")]
    InvalidWindow { start: NaiveDate, end: NaiveDate },

    #[error("Cannot create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to encode table {table}: {source}")]
    Encode {
        table: &'static str,
        #[source]
        source: csv::Error,
    },
}

/// Recoverable errors scoped to one input file
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Malformed value '{value}' for field '{field}' in {path} at record {record}")]
    Malformed {
        path: PathBuf,
        record: usize,
        field: &'static str,
        value: String,
    },
}

impl SourceError {
    /// Path of the file that failed
    pub fn path(&self) -> &PathBuf {
        match self {
            SourceError::Io { path, .. }
            | SourceError::Json { path, .. }
            | SourceError::Csv { path, .. }
            | SourceError::Malformed { path, .. } => path,
        }
    }
}
