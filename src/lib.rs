//! fitport - Fitbit Takeout to Garmin Connect CSV converter
//!
//! fitport reconciles the per-metric files of a Google Takeout Fitbit archive
//! into the CSV tables Garmin Connect imports, through a one-way pipeline:
//! source scanning → per-metric aggregation → cross-source reconciliation
//! → CSV encoding.
//!
//! ## Outputs
//!
//! - **Importable**: body composition, daily activities, sleep sessions
//! - **Supplementary**: resting heart rate, HRV, respiratory rate, SpO2,
//!   sleep scores and readiness, kept as plain date-keyed tables

pub mod adapters;
pub mod config;
pub mod encoder;
pub mod error;
pub mod normalizer;
pub mod pipeline;
pub mod reconcile;
pub mod scanner;
pub mod types;

pub use config::{ConvertConfig, DateWindow, SourceLayout};
pub use error::{ConvertError, SourceError};
pub use pipeline::{convert_takeout, Converter};
pub use types::{ConversionManifest, OutputSummary, SourceWarning, TableKind};

/// Converter version reported by the CLI
pub const CONVERTER_VERSION: &str = env!("CARGO_PKG_VERSION");
