//! Source adapters
//!
//! This module reads the raw export files (JSON arrays and header+rows CSV),
//! filters records by date window, converts units and folds them into
//! date- or session-keyed accumulators. One submodule per metric family.

pub mod activity;
pub mod body;
pub mod sleep;
pub mod supplementary;

pub use activity::{aggregate_activity, ActivityCounters};
pub use body::{read_body_fat, GlobalExportWeights, WeightGramsCsv};
pub use sleep::{accumulate_stages, read_sleep_sessions};
pub use supplementary::read_supplementary;

use chrono::NaiveDate;
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::DateWindow;
use crate::error::SourceError;
use crate::normalizer::parse_date;
use crate::types::{BodyTable, SourceWarning};

/// Pounds to kilograms factor
pub const KG_PER_POUND: f64 = 0.453592;

/// A source of per-day body metrics.
///
/// Sources are consulted in precedence order; the first one that yields any
/// record in the window is used on its own.
pub trait BodySource {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Load every in-window record, or `None` when the source has nothing
    fn load(&self, window: &DateWindow, warnings: &mut Warnings) -> Option<BodyTable>;
}

/// Recoverable per-file failures collected during a run
#[derive(Debug, Default)]
pub struct Warnings {
    entries: Vec<SourceWarning>,
}

impl Warnings {
    /// Log and keep a failure; the run continues with the next file
    pub fn record(&mut self, error: SourceError) {
        warn!("Error reading {}: {}", error.path().display(), error);
        self.entries.push(SourceWarning {
            path: error.path().clone(),
            message: error.to_string(),
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_vec(self) -> Vec<SourceWarning> {
        self.entries
    }
}

/// Position of a record inside a file, for error reporting
#[derive(Debug, Clone, Copy)]
pub(crate) struct RowContext<'a> {
    pub path: &'a Path,
    pub record: usize,
}

impl RowContext<'_> {
    /// Read a decimal field. Missing or empty counts as zero.
    pub fn number(&self, field: &'static str, raw: Option<&str>) -> Result<f64, SourceError> {
        match raw.map(str::trim) {
            None | Some("") => Ok(0.0),
            Some(text) => text.parse::<f64>().map_err(|_| self.malformed(field, text)),
        }
    }

    /// Read a decimal field and truncate it toward zero
    pub fn whole(&self, field: &'static str, raw: Option<&str>) -> Result<i64, SourceError> {
        let value = self.number(field, raw)?;
        if !value.is_finite() {
            return Err(self.malformed(field, raw.unwrap_or_default()));
        }
        Ok(value.trunc() as i64)
    }

    /// Read a JSON field that may be a number or numeric text
    pub fn json_number(
        &self,
        field: &'static str,
        raw: Option<&NumericField>,
    ) -> Result<f64, SourceError> {
        match raw {
            Some(NumericField::Number(value)) => Ok(*value),
            Some(NumericField::Text(text)) => self.number(field, Some(text)),
            None => Ok(0.0),
        }
    }

    fn malformed(&self, field: &'static str, value: &str) -> SourceError {
        SourceError::Malformed {
            path: self.path.to_path_buf(),
            record: self.record,
            field,
            value: value.to_string(),
        }
    }
}

/// JSON value exported either as a number or as text
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub(crate) enum NumericField {
    Number(f64),
    Text(String),
}

/// Calendar date of a record if it parses and falls inside the window
pub(crate) fn dated(window: &DateWindow, raw: Option<&str>) -> Option<NaiveDate> {
    raw.and_then(parse_date).filter(|date| window.contains(*date))
}

/// Read a whole CSV file and fold each record in order.
///
/// The first error stops the file. Records folded before it stay folded.
pub(crate) fn fold_csv<T, F>(path: &Path, mut fold: F) -> Result<(), SourceError>
where
    T: DeserializeOwned,
    F: FnMut(RowContext<'_>, T) -> Result<(), SourceError>,
{
    debug!("Reading {}", path.display());
    let bytes = fs::read(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes.as_slice());

    for (index, result) in reader.deserialize::<T>().enumerate() {
        let row = result.map_err(|source| SourceError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        let ctx = RowContext {
            path,
            record: index + 1,
        };
        fold(ctx, row)?;
    }

    Ok(())
}

/// Fold every file of a family, turning per-file failures into warnings
pub(crate) fn fold_files<T, F>(files: &[PathBuf], warnings: &mut Warnings, mut fold: F)
where
    T: DeserializeOwned,
    F: FnMut(RowContext<'_>, T) -> Result<(), SourceError>,
{
    for path in files {
        if let Err(e) = fold_csv(path, &mut fold) {
            warnings.record(e);
        }
    }
}

/// Read a file holding a JSON array of objects
pub(crate) fn read_json_array<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, SourceError> {
    debug!("Reading {}", path.display());
    let bytes = fs::read(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| SourceError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Round to a fixed number of decimal places.
///
/// Goes through the exact decimal expansion, so a tie on the stored binary
/// value goes to the even digit (22.25 gives 22.2, 20.75 gives 20.8).
pub fn round_to(value: f64, places: usize) -> f64 {
    format!("{value:.places$}").parse().unwrap_or(value)
}

/// Pounds to kilograms, one decimal
pub fn pounds_to_kg(pounds: f64) -> f64 {
    round_to(pounds * KG_PER_POUND, 1)
}

/// Grams to kilograms, one decimal
pub fn grams_to_kg(grams: f64) -> f64 {
    round_to(grams / 1000.0, 1)
}

/// Meters to kilometers, two decimals
pub fn meters_to_km(meters: f64) -> f64 {
    round_to(meters / 1000.0, 2)
}
