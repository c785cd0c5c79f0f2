//! Conversion configuration
//!
//! Resolves the fixed directory layout of a Takeout archive, holds the
//! inclusive date window and the input/output locations for a run.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConvertError;

/// Minute-level counters and daily single-value metrics. Required.
pub const PHYSICAL_ACTIVITY_DIR: &str = "Physical Activity_GoogleData";
/// Weight logs with BMI and body fat
pub const GLOBAL_EXPORT_DIR: &str = "Global Export Data";
/// Sleep sessions and sleep stages
pub const HEALTH_FITNESS_DIR: &str = "Health Fitness Data_GoogleData";
pub const SLEEP_SCORE_DIR: &str = "Sleep Score";
pub const SPO2_DIR: &str = "Oxygen Saturation (SpO2)";

/// Calendar date format accepted for window bounds
pub const DATE_ARG_FORMAT: &str = "%Y-%m-%d";

/// Directories of a Takeout archive, resolved against its root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLayout {
    pub root: PathBuf,
    pub physical_activity: PathBuf,
    pub global_export: PathBuf,
    pub health_fitness: PathBuf,
    pub sleep_score: PathBuf,
    pub spo2: PathBuf,
}

impl SourceLayout {
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        Self {
            physical_activity: root.join(PHYSICAL_ACTIVITY_DIR),
            global_export: root.join(GLOBAL_EXPORT_DIR),
            health_fitness: root.join(HEALTH_FITNESS_DIR),
            sleep_score: root.join(SLEEP_SCORE_DIR),
            spo2: root.join(SPO2_DIR),
            root,
        }
    }

    /// Check the root and the one required subdirectory exist.
    ///
    /// All other subdirectories are optional; a missing one simply
    /// contributes no records.
    pub fn validate(&self) -> Result<(), ConvertError> {
        if !self.root.is_dir() {
            return Err(ConvertError::InputDirNotFound(self.root.clone()));
        }
        if !self.physical_activity.is_dir() {
            return Err(ConvertError::MissingSubdirectory(
                self.physical_activity.clone(),
            ));
        }
        Ok(())
    }
}

/// Inclusive calendar-date window. An absent bound is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
}

impl DateWindow {
    /// Build a window, rejecting `start > end`
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<Self, ConvertError> {
        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                return Err(ConvertError::InvalidWindow { start, end });
            }
        }
        Ok(Self { start, end })
    }

    /// Window covering every date
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Window covering exactly the given dates, inclusive
    pub fn between(start: NaiveDate, end: NaiveDate) -> Result<Self, ConvertError> {
        Self::new(Some(start), Some(end))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |start| date >= start) && self.end.map_or(true, |end| date <= end)
    }

    /// Parse a `YYYY-MM-DD` window bound; `bound` names it in the error
    pub fn parse_bound(bound: &'static str, value: &str) -> Result<NaiveDate, ConvertError> {
        NaiveDate::parse_from_str(value.trim(), DATE_ARG_FORMAT).map_err(|_| {
            ConvertError::InvalidDate {
                bound,
                value: value.to_string(),
            }
        })
    }
}

impl std::fmt::Display for DateWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.start, self.end) {
            (None, None) => write!(f, "all available data"),
            (Some(start), Some(end)) => write!(f, "{start} to {end}"),
            (Some(start), None) => write!(f, "{start} onwards"),
            (None, Some(end)) => write!(f, "up to {end}"),
        }
    }
}

/// Settings for one conversion run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub window: DateWindow,
}

impl ConvertConfig {
    /// Config over the whole archive, writing next to the input directory
    pub fn new(input_dir: impl Into<PathBuf>) -> Self {
        let input_dir = input_dir.into();
        let output_dir = default_output_dir(&input_dir);
        Self {
            input_dir,
            output_dir,
            window: DateWindow::unbounded(),
        }
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    pub fn with_window(mut self, window: DateWindow) -> Self {
        self.window = window;
        self
    }

    pub fn layout(&self) -> SourceLayout {
        SourceLayout::new(&self.input_dir)
    }
}

/// Parent of the input directory, or the directory itself at a filesystem root
fn default_output_dir(input_dir: &Path) -> PathBuf {
    input_dir
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| input_dir.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_window_is_inclusive() {
        let window = DateWindow::between(date("2025-01-01"), date("2025-01-31")).unwrap();
        assert!(window.contains(date("2025-01-01")));
        assert!(window.contains(date("2025-01-31")));
        assert!(!window.contains(date("2024-12-31")));
        assert!(!window.contains(date("2025-02-01")));
    }

    #[test]
    fn test_half_open_and_unbounded_windows() {
        let unbounded = DateWindow::unbounded();
        assert_eq!(unbounded.to_string(), "all available data");
        assert!(unbounded.contains(date("1900-01-01")));
        assert!(unbounded.contains(date("2999-12-31")));

        let from = DateWindow::new(Some(date("2025-06-01")), None).unwrap();
        assert!(!from.contains(date("2025-05-31")));
        assert!(from.contains(date("2099-01-01")));
    }

    #[test]
    fn test_inverted_window_rejected() {
        let err = DateWindow::between(date("2025-02-01"), date("2025-01-01")).unwrap_err();
        assert!(matches!(err, ConvertError::InvalidWindow { .. }));
    }

    #[test]
    fn test_parse_bound() {
        assert_eq!(
            DateWindow::parse_bound("start", "2025-03-09").unwrap(),
            date("2025-03-09")
        );
        let err = DateWindow::parse_bound("end", "03/09/2025").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid end date '03/09/2025'. Use YYYY-MM-DD format."
        );
    }

    #[test]
    fn test_default_output_dir_is_parent() {
        let config = ConvertConfig::new("/data/Takeout/Fitbit");
        assert_eq!(config.output_dir, PathBuf::from("/data/Takeout"));

        let layout = config.layout();
        assert_eq!(
            layout.physical_activity,
            PathBuf::from("/data/Takeout/Fitbit/Physical Activity_GoogleData")
        );
    }

    #[test]
    fn test_validate_missing_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = SourceLayout::new(tmp.path().join("nope"));
        assert!(matches!(
            missing.validate(),
            Err(ConvertError::InputDirNotFound(_))
        ));

        let layout = SourceLayout::new(tmp.path());
        assert!(matches!(
            layout.validate(),
            Err(ConvertError::MissingSubdirectory(_))
        ));

        std::fs::create_dir(&layout.physical_activity).unwrap();
        assert!(layout.validate().is_ok());
    }
}
