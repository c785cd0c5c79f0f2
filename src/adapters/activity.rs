//! Daily activity counters
//!
//! Folds minute-level step, calorie, distance and floor counts, active-minute
//! splits and activity-level labels into per-day totals.

use log::info;
use serde::Deserialize;
use std::collections::HashMap;
use std::ops::AddAssign;
use std::path::Path;

use super::{dated, fold_files, RowContext, Warnings};
use crate::config::DateWindow;
use crate::error::SourceError;
use crate::scanner::scan;
use crate::types::DailySeries;

pub const STEPS_PATTERN: &str = "steps_*.csv";
pub const CALORIES_PATTERN: &str = "calories_*.csv";
pub const DISTANCE_PATTERN: &str = "distance_*.csv";
pub const FLOORS_PATTERN: &str = "floors_*.csv";
pub const ACTIVE_MINUTES_PATTERN: &str = "active_minutes_*.csv";
pub const ACTIVITY_LEVEL_PATTERN: &str = "activity_level_*.csv";

/// Activity-level label counted as one sedentary minute
pub const SEDENTARY_LEVEL: &str = "SEDENTARY";

/// Per-day activity accumulators, one series per counter
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityCounters {
    pub steps: DailySeries<i64>,
    pub calories: DailySeries<f64>,
    pub distance_m: DailySeries<f64>,
    pub floors: DailySeries<i64>,
    pub minutes_sedentary: DailySeries<i64>,
    pub minutes_light: DailySeries<i64>,
    pub minutes_fairly: DailySeries<i64>,
    pub minutes_very: DailySeries<i64>,
}

/// Aggregate every activity family found in `dir`
pub fn aggregate_activity(
    dir: &Path,
    window: &DateWindow,
    warnings: &mut Warnings,
) -> ActivityCounters {
    let mut counters = ActivityCounters {
        steps: sum_column(dir, STEPS_PATTERN, "steps", window, warnings, |ctx, raw| {
            ctx.whole("steps", raw)
        }),
        calories: sum_column(dir, CALORIES_PATTERN, "calories", window, warnings, |ctx, raw| {
            ctx.number("calories", raw)
        }),
        distance_m: sum_column(dir, DISTANCE_PATTERN, "distance", window, warnings, |ctx, raw| {
            ctx.number("distance", raw)
        }),
        floors: sum_column(dir, FLOORS_PATTERN, "floors", window, warnings, |ctx, raw| {
            ctx.whole("floors", raw)
        }),
        ..Default::default()
    };

    fold_active_minutes(dir, window, warnings, &mut counters);
    fold_sedentary_minutes(dir, window, warnings, &mut counters);

    info!(
        "Activity: {} step days, {} calorie days, {} distance days",
        counters.steps.len(),
        counters.calories.len(),
        counters.distance_m.len()
    );
    counters
}

/// Sum one numeric column per day across a file family
fn sum_column<V, F>(
    dir: &Path,
    pattern: &str,
    column: &str,
    window: &DateWindow,
    warnings: &mut Warnings,
    read: F,
) -> DailySeries<V>
where
    V: AddAssign + Default,
    F: Fn(&RowContext<'_>, Option<&str>) -> Result<V, SourceError>,
{
    let mut daily: DailySeries<V> = DailySeries::new();
    let files = scan(dir, pattern);

    fold_files(&files, warnings, |ctx, row: HashMap<String, String>| {
        if let Some(date) = dated(window, row.get("timestamp").map(String::as_str)) {
            let value = read(&ctx, row.get(column).map(String::as_str))?;
            *daily.entry(date).or_default() += value;
        }
        Ok(())
    });

    daily
}

fn fold_active_minutes(
    dir: &Path,
    window: &DateWindow,
    warnings: &mut Warnings,
    counters: &mut ActivityCounters,
) {
    let files = scan(dir, ACTIVE_MINUTES_PATTERN);

    fold_files(&files, warnings, |ctx, row: ActiveMinutesRow| {
        if let Some(date) = dated(window, row.timestamp.as_deref()) {
            let light = ctx.whole("light", row.light.as_deref())?;
            let moderate = ctx.whole("moderate", row.moderate.as_deref())?;
            let very = ctx.whole("very", row.very.as_deref())?;

            *counters.minutes_light.entry(date).or_default() += light;
            *counters.minutes_fairly.entry(date).or_default() += moderate;
            *counters.minutes_very.entry(date).or_default() += very;
        }
        Ok(())
    });
}

fn fold_sedentary_minutes(
    dir: &Path,
    window: &DateWindow,
    warnings: &mut Warnings,
    counters: &mut ActivityCounters,
) {
    let files = scan(dir, ACTIVITY_LEVEL_PATTERN);

    fold_files(&files, warnings, |_, row: ActivityLevelRow| {
        if let Some(date) = dated(window, row.timestamp.as_deref()) {
            if row.level.as_deref() == Some(SEDENTARY_LEVEL) {
                *counters.minutes_sedentary.entry(date).or_default() += 1;
            }
        }
        Ok(())
    });
}

// Export record structures

#[derive(Debug, Deserialize)]
struct ActiveMinutesRow {
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    light: Option<String>,
    #[serde(default)]
    moderate: Option<String>,
    #[serde(default)]
    very: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ActivityLevelRow {
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    level: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::test_support::write;
    use chrono::NaiveDate;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn fixture() -> tempfile::TempDir {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();
        write(
            dir,
            "steps_2025-01-01.csv",
            "timestamp,steps\n2025-01-01T08:00:00Z,100.9\n2025-01-01T08:01:00Z,50\n2025-01-02T08:00:00Z,7\n",
        );
        write(
            dir,
            "calories_2025-01-01.csv",
            "timestamp,calories\n2025-01-01T08:00:00Z,1.25\n2025-01-01T08:01:00Z,1.5\n",
        );
        write(
            dir,
            "distance_2025-01-01.csv",
            "timestamp,distance\n2025-01-01T08:00:00Z,2500.5\n2025-01-01T08:01:00Z,2499.5\n",
        );
        write(
            dir,
            "floors_2025-01-01.csv",
            "timestamp,floors\n2025-01-03T08:00:00Z,2\n",
        );
        write(
            dir,
            "active_minutes_2025-01-01.csv",
            "timestamp,light,moderate,very\n2025-01-01T00:00:00Z,30,10,5\n2025-01-01T12:00:00Z,15,0,1\n",
        );
        write(
            dir,
            "activity_level_2025-01-01.csv",
            "timestamp,level\n2025-01-01T00:00:00Z,SEDENTARY\n2025-01-01T00:01:00Z,SEDENTARY\n2025-01-01T00:02:00Z,LIGHTLY_ACTIVE\n",
        );
        tmp
    }

    #[test]
    fn test_aggregate_activity() {
        let tmp = fixture();
        let mut warnings = Warnings::default();
        let counters = aggregate_activity(tmp.path(), &DateWindow::unbounded(), &mut warnings);

        assert!(warnings.is_empty());
        // Each row truncated before summing
        assert_eq!(counters.steps[&date("2025-01-01")], 150);
        assert_eq!(counters.steps[&date("2025-01-02")], 7);
        assert_eq!(counters.calories[&date("2025-01-01")], 2.75);
        assert_eq!(counters.distance_m[&date("2025-01-01")], 5000.0);
        assert_eq!(counters.floors[&date("2025-01-03")], 2);
        assert_eq!(counters.minutes_light[&date("2025-01-01")], 45);
        assert_eq!(counters.minutes_fairly[&date("2025-01-01")], 10);
        assert_eq!(counters.minutes_very[&date("2025-01-01")], 6);
        assert_eq!(counters.minutes_sedentary[&date("2025-01-01")], 2);
    }

    #[test]
    fn test_out_of_window_rows_ignored() {
        let tmp = fixture();
        let window = DateWindow::between(date("2025-01-02"), date("2025-01-02")).unwrap();
        let mut warnings = Warnings::default();
        let counters = aggregate_activity(tmp.path(), &window, &mut warnings);

        assert_eq!(counters.steps.len(), 1);
        assert!(counters.calories.is_empty());
        assert!(counters.minutes_sedentary.is_empty());
        assert!(counters.floors.is_empty());
    }

    #[test]
    fn test_bad_file_does_not_stop_family() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            tmp.path(),
            "steps_2025-01-01.csv",
            "timestamp,steps\n2025-01-01T08:00:00Z,ten\n",
        );
        write(
            tmp.path(),
            "steps_2025-02-01.csv",
            "timestamp,steps\n2025-02-01T08:00:00Z,10\n",
        );

        let mut warnings = Warnings::default();
        let counters = aggregate_activity(tmp.path(), &DateWindow::unbounded(), &mut warnings);
        assert_eq!(warnings.len(), 1);
        assert_eq!(counters.steps.len(), 1);
        assert_eq!(counters.steps[&date("2025-02-01")], 10);
    }
}
