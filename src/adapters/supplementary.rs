//! Supplementary daily metrics
//!
//! Resting heart rate, HRV, respiratory rate, SpO2, sleep scores and
//! readiness. None of these can be imported by the destination platform, so
//! values are carried through as exported text. Each table is keyed by date
//! and a later record for the same date replaces the earlier one.

use log::info;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::Path;

use super::{dated, fold_files, round_to, Warnings};
use crate::config::{DateWindow, SourceLayout};
use crate::scanner::scan;
use crate::types::{
    DailySeries, HeartRateVariability, Readiness, Reading, RespiratoryRate, RestingHeartRate,
    SleepScore, SpO2Summary, SupplementaryTables,
};

pub const RESTING_HR_FILE: &str = "daily_resting_heart_rate.csv";
pub const HRV_FILE: &str = "daily_heart_rate_variability.csv";
pub const RESPIRATORY_RATE_FILE: &str = "daily_respiratory_rate.csv";
pub const READINESS_FILE: &str = "daily_readiness.csv";
pub const SLEEP_SCORE_FILE: &str = "sleep_score.csv";
pub const SPO2_PATTERN: &str = "Daily SpO2 - *.csv";

/// A daily export row that maps onto one supplementary record
trait DailyRow: DeserializeOwned {
    type Record;

    fn timestamp(&self) -> Option<&str>;

    fn into_record(self) -> Self::Record;
}

/// Read all supplementary tables from their directories
pub fn read_supplementary(
    layout: &SourceLayout,
    window: &DateWindow,
    warnings: &mut Warnings,
) -> SupplementaryTables {
    let activity = &layout.physical_activity;

    let tables = SupplementaryTables {
        resting_hr: read_daily::<RestingHeartRateRow>(activity, RESTING_HR_FILE, window, warnings),
        hrv: read_daily::<HrvRow>(activity, HRV_FILE, window, warnings),
        respiratory_rate: read_daily::<RespiratoryRateRow>(
            activity,
            RESPIRATORY_RATE_FILE,
            window,
            warnings,
        ),
        spo2: read_daily::<SpO2Row>(&layout.spo2, SPO2_PATTERN, window, warnings),
        sleep_scores: read_daily::<SleepScoreRow>(
            &layout.sleep_score,
            SLEEP_SCORE_FILE,
            window,
            warnings,
        ),
        readiness: read_daily::<ReadinessRow>(activity, READINESS_FILE, window, warnings),
    };

    info!(
        "Supplementary: {} resting HR, {} HRV, {} respiratory, {} SpO2, {} sleep score, {} readiness days",
        tables.resting_hr.len(),
        tables.hrv.len(),
        tables.respiratory_rate.len(),
        tables.spo2.len(),
        tables.sleep_scores.len(),
        tables.readiness.len()
    );
    tables
}

fn read_daily<R: DailyRow>(
    dir: &Path,
    pattern: &str,
    window: &DateWindow,
    warnings: &mut Warnings,
) -> DailySeries<R::Record> {
    let mut daily = DailySeries::new();
    let files = scan(dir, pattern);

    fold_files(&files, warnings, |_, row: R| {
        if let Some(date) = dated(window, row.timestamp()) {
            daily.insert(date, row.into_record());
        }
        Ok(())
    });

    daily
}

/// Numeric readings are rounded to one decimal; anything else is kept as is
fn reading(raw: String) -> Reading {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Reading::Value(round_to(value, 1)),
        _ => Reading::Raw(raw),
    }
}

// Export record structures

#[derive(Debug, Deserialize)]
struct RestingHeartRateRow {
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default, rename = "beats per minute")]
    beats_per_minute: String,
}

impl DailyRow for RestingHeartRateRow {
    type Record = RestingHeartRate;

    fn timestamp(&self) -> Option<&str> {
        self.timestamp.as_deref()
    }

    fn into_record(self) -> RestingHeartRate {
        RestingHeartRate {
            resting_hr: reading(self.beats_per_minute),
        }
    }
}

#[derive(Debug, Deserialize)]
struct HrvRow {
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default, rename = "average heart rate variability milliseconds")]
    average_hrv: String,
    #[serde(default, rename = "non rem heart rate beats per minute")]
    nrem_heart_rate: String,
    #[serde(default)]
    entropy: String,
    #[serde(
        default,
        rename = "deep sleep root mean square of successive differences milliseconds"
    )]
    deep_sleep_rmssd: String,
}

impl DailyRow for HrvRow {
    type Record = HeartRateVariability;

    fn timestamp(&self) -> Option<&str> {
        self.timestamp.as_deref()
    }

    fn into_record(self) -> HeartRateVariability {
        HeartRateVariability {
            hrv_rmssd: self.average_hrv,
            nrem_hr: self.nrem_heart_rate,
            entropy: self.entropy,
            deep_sleep_rmssd: self.deep_sleep_rmssd,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RespiratoryRateRow {
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default, rename = "breaths per minute")]
    breaths_per_minute: String,
}

impl DailyRow for RespiratoryRateRow {
    type Record = RespiratoryRate;

    fn timestamp(&self) -> Option<&str> {
        self.timestamp.as_deref()
    }

    fn into_record(self) -> RespiratoryRate {
        RespiratoryRate {
            respiratory_rate: self.breaths_per_minute,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SpO2Row {
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    average_value: String,
    #[serde(default)]
    lower_bound: String,
    #[serde(default)]
    upper_bound: String,
}

impl DailyRow for SpO2Row {
    type Record = SpO2Summary;

    fn timestamp(&self) -> Option<&str> {
        self.timestamp.as_deref()
    }

    fn into_record(self) -> SpO2Summary {
        SpO2Summary {
            avg_spo2: self.average_value,
            min_spo2: self.lower_bound,
            max_spo2: self.upper_bound,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SleepScoreRow {
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    overall_score: String,
    #[serde(default)]
    composition_score: String,
    #[serde(default)]
    revitalization_score: String,
    #[serde(default)]
    duration_score: String,
    #[serde(default)]
    deep_sleep_in_minutes: String,
    #[serde(default)]
    resting_heart_rate: String,
}

impl DailyRow for SleepScoreRow {
    type Record = SleepScore;

    fn timestamp(&self) -> Option<&str> {
        self.timestamp.as_deref()
    }

    fn into_record(self) -> SleepScore {
        SleepScore {
            overall_score: self.overall_score,
            composition_score: self.composition_score,
            revitalization_score: self.revitalization_score,
            duration_score: self.duration_score,
            deep_sleep_min: self.deep_sleep_in_minutes,
            resting_hr: self.resting_heart_rate,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ReadinessRow {
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    score: String,
    #[serde(default, rename = "type")]
    level: String,
    #[serde(default, rename = "heart rate variability readiness")]
    hrv_readiness: String,
    #[serde(default, rename = "resting heart rate readiness")]
    rhr_readiness: String,
    #[serde(default, rename = "sleep readiness")]
    sleep_readiness: String,
}

impl DailyRow for ReadinessRow {
    type Record = Readiness;

    fn timestamp(&self) -> Option<&str> {
        self.timestamp.as_deref()
    }

    fn into_record(self) -> Readiness {
        Readiness {
            score: self.score,
            level: self.level,
            hrv_readiness: self.hrv_readiness,
            rhr_readiness: self.rhr_readiness,
            sleep_readiness: self.sleep_readiness,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::test_support::write;
    use chrono::NaiveDate;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn layout() -> (tempfile::TempDir, SourceLayout) {
        let tmp = tempfile::tempdir().unwrap();
        let layout = SourceLayout::new(tmp.path());
        (tmp, layout)
    }

    #[test]
    fn test_resting_heart_rate_rounding() {
        let (_tmp, layout) = layout();
        write(
            &layout.physical_activity,
            RESTING_HR_FILE,
            "timestamp,beats per minute,data source\n2025-01-01,58.26,APP\n2025-01-02,n/a,APP\n2025-01-03,,APP\n",
        );

        let mut warnings = Warnings::default();
        let tables = read_supplementary(&layout, &DateWindow::unbounded(), &mut warnings);

        assert_eq!(tables.resting_hr[&date("2025-01-01")].resting_hr, Reading::Value(58.3));
        assert_eq!(
            tables.resting_hr[&date("2025-01-02")].resting_hr,
            Reading::Raw("n/a".to_string())
        );
        assert_eq!(
            tables.resting_hr[&date("2025-01-03")].resting_hr,
            Reading::Raw(String::new())
        );
    }

    #[test]
    fn test_pass_through_tables() {
        let (_tmp, layout) = layout();
        write(
            &layout.physical_activity,
            HRV_FILE,
            "timestamp,average heart rate variability milliseconds,non rem heart rate beats per minute,entropy,deep sleep root mean square of successive differences milliseconds\n2025-01-01T00:00:00,41.2,55.1,2.9,44.0\n",
        );
        write(
            &layout.physical_activity,
            READINESS_FILE,
            "timestamp,score,type,heart rate variability readiness,resting heart rate readiness,sleep readiness\n2025-01-01,72,MODERATE,HIGH,LOW,MEDIUM\n",
        );
        write(
            &layout.sleep_score,
            SLEEP_SCORE_FILE,
            "sleep_log_entry_id,timestamp,overall_score,composition_score,revitalization_score,duration_score,deep_sleep_in_minutes,resting_heart_rate,restlessness\n1,2025-01-01T07:00:00Z,81,20,21,40,73,56,0.07\n",
        );
        write(
            &layout.spo2,
            "Daily SpO2 - 2025-01-01-2025-01-31.csv",
            "timestamp,average_value,lower_bound,upper_bound\n2025-01-01T00:00:00Z,95.4,92.0,98.1\n2025-03-01T00:00:00Z,96,93,99\n",
        );

        let window = DateWindow::between(date("2025-01-01"), date("2025-01-31")).unwrap();
        let mut warnings = Warnings::default();
        let tables = read_supplementary(&layout, &window, &mut warnings);

        assert!(warnings.is_empty());
        assert_eq!(tables.hrv[&date("2025-01-01")].entropy, "2.9");
        assert_eq!(tables.readiness[&date("2025-01-01")].level, "MODERATE");
        assert_eq!(tables.sleep_scores[&date("2025-01-01")].deep_sleep_min, "73");
        assert_eq!(tables.spo2.len(), 1);
        assert_eq!(tables.spo2[&date("2025-01-01")].max_spo2, "98.1");
        assert!(tables.respiratory_rate.is_empty());
    }

    #[test]
    fn test_same_date_last_record_wins() {
        let (_tmp, layout) = layout();
        write(
            &layout.physical_activity,
            RESPIRATORY_RATE_FILE,
            "timestamp,breaths per minute\n2025-01-01T00:00:00,14.2\n2025-01-01T06:00:00,15.0\n",
        );

        let mut warnings = Warnings::default();
        let tables = read_supplementary(&layout, &DateWindow::unbounded(), &mut warnings);
        assert_eq!(tables.respiratory_rate.len(), 1);
        assert_eq!(
            tables.respiratory_rate[&date("2025-01-01")].respiratory_rate,
            "15.0"
        );
    }
}
