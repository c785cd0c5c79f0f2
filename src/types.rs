//! Core types for the fitport pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! conversion: per-day accumulators, sleep sessions and their stage totals,
//! supplementary health records, and the manifest describing what was written.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::config::DateWindow;

/// Date-keyed accumulator. Iteration order is ascending by date, which is the
/// order every date-keyed output table is written in.
pub type DailySeries<T> = BTreeMap<NaiveDate, T>;

/// Body composition for one day
///
/// `None` means no source supplied the value. The fallback weight source and
/// body-fat-only days leave fields unset; they are rendered as `0` on output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BodyMetric {
    /// Body weight (kg, one decimal)
    pub weight_kg: Option<f64>,
    /// Body mass index (one decimal)
    pub bmi: Option<f64>,
    /// Body fat (percent, one decimal)
    pub fat_percent: Option<f64>,
}

pub type BodyTable = DailySeries<BodyMetric>;

/// Baseline daily burn subtracted from total calories to estimate activity calories
pub const BASAL_CALORIES_ESTIMATE: i64 = 1500;

/// One day of activity counters, ready for emission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivitySummary {
    pub date: NaiveDate,
    /// Total calories burned (kcal, rounded)
    pub calories_burned: i64,
    pub steps: i64,
    /// Distance (km, two decimals)
    pub distance_km: f64,
    pub floors: i64,
    pub minutes_sedentary: i64,
    pub minutes_light: i64,
    pub minutes_fairly: i64,
    pub minutes_very: i64,
    /// Estimated activity calories, see [`activity_calories`]
    pub activity_calories: i64,
}

/// Fixed heuristic: calories above a 1500 kcal basal estimate, never negative.
pub fn activity_calories(calories_burned: i64) -> i64 {
    if calories_burned > 0 {
        (calories_burned - BASAL_CALORIES_ESTIMATE).max(0)
    } else {
        0
    }
}

/// Sleep stage classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SleepStage {
    Awake,
    Light,
    Deep,
    Rem,
    Unknown,
}

impl SleepStage {
    /// Map a stage label from the export (`REM`, `LIGHT`, `DEEP`, `AWAKE`)
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "REM" => SleepStage::Rem,
            "LIGHT" => SleepStage::Light,
            "DEEP" => SleepStage::Deep,
            "AWAKE" => SleepStage::Awake,
            _ => SleepStage::Unknown,
        }
    }
}

/// A sleep session keyed by its export identifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepSession {
    pub id: String,
    /// Position at which the id was first read; breaks ties on `start_raw`
    pub seq: usize,
    /// Session start exactly as exported; output rows sort on this text
    pub start_raw: String,
    pub start: DateTime<FixedOffset>,
    /// `None` when the end timestamp could not be parsed
    pub end: Option<DateTime<FixedOffset>>,
    pub minutes_asleep: i64,
    pub minutes_awake: i64,
    pub minutes_in_period: i64,
    /// UTC offset recorded for the start, e.g. `+01:00`
    pub start_offset: String,
    /// UTC offset recorded for the end
    pub end_offset: String,
}

/// Stage totals accumulated for one session
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SleepStageTotals {
    pub rem_minutes: f64,
    pub light_minutes: f64,
    pub deep_minutes: f64,
    /// Number of AWAKE stage records
    pub awake_count: u32,
}

impl SleepStageTotals {
    /// Fold one stage record of the given duration
    pub fn add(&mut self, stage: SleepStage, minutes: f64) {
        match stage {
            SleepStage::Rem => self.rem_minutes += minutes,
            SleepStage::Light => self.light_minutes += minutes,
            SleepStage::Deep => self.deep_minutes += minutes,
            SleepStage::Awake => self.awake_count += 1,
            SleepStage::Unknown => {}
        }
    }
}

/// A session joined with its stage totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepRecord {
    pub session: SleepSession,
    pub stages: SleepStageTotals,
}

/// A value that is numeric when it parses and kept verbatim otherwise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reading {
    Value(f64),
    Raw(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestingHeartRate {
    pub resting_hr: Reading,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeartRateVariability {
    pub hrv_rmssd: String,
    pub nrem_hr: String,
    pub entropy: String,
    pub deep_sleep_rmssd: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RespiratoryRate {
    pub respiratory_rate: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpO2Summary {
    pub avg_spo2: String,
    pub min_spo2: String,
    pub max_spo2: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SleepScore {
    pub overall_score: String,
    pub composition_score: String,
    pub revitalization_score: String,
    pub duration_score: String,
    pub deep_sleep_min: String,
    pub resting_hr: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Readiness {
    pub score: String,
    pub level: String,
    pub hrv_readiness: String,
    pub rhr_readiness: String,
    pub sleep_readiness: String,
}

/// Supplementary health metrics the destination platform cannot import
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SupplementaryTables {
    pub resting_hr: DailySeries<RestingHeartRate>,
    pub hrv: DailySeries<HeartRateVariability>,
    pub respiratory_rate: DailySeries<RespiratoryRate>,
    pub spo2: DailySeries<SpO2Summary>,
    pub sleep_scores: DailySeries<SleepScore>,
    pub readiness: DailySeries<Readiness>,
}

/// Every table the converter writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Body,
    Activities,
    Sleep,
    RestingHeartRate,
    HeartRateVariability,
    RespiratoryRate,
    SpO2,
    SleepScores,
    Readiness,
}

impl TableKind {
    pub const ALL: [TableKind; 9] = [
        TableKind::Body,
        TableKind::Activities,
        TableKind::Sleep,
        TableKind::RestingHeartRate,
        TableKind::HeartRateVariability,
        TableKind::RespiratoryRate,
        TableKind::SpO2,
        TableKind::SleepScores,
        TableKind::Readiness,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            TableKind::Body => "garmin_body.csv",
            TableKind::Activities => "garmin_activities.csv",
            TableKind::Sleep => "garmin_sleep.csv",
            TableKind::RestingHeartRate => "garmin_supplement_resting_hr.csv",
            TableKind::HeartRateVariability => "garmin_supplement_hrv.csv",
            TableKind::RespiratoryRate => "garmin_supplement_respiratory_rate.csv",
            TableKind::SpO2 => "garmin_supplement_spo2.csv",
            TableKind::SleepScores => "garmin_supplement_sleep_scores.csv",
            TableKind::Readiness => "garmin_supplement_readiness.csv",
        }
    }

    /// Unquoted marker line written before the header
    pub fn marker(&self) -> &'static str {
        match self {
            TableKind::Body => "Body",
            TableKind::Activities => "Activities",
            TableKind::Sleep => "Sleep",
            TableKind::RestingHeartRate => "RestingHeartRate",
            TableKind::HeartRateVariability => "HeartRateVariability",
            TableKind::RespiratoryRate => "RespiratoryRate",
            TableKind::SpO2 => "SpO2",
            TableKind::SleepScores => "SleepScores",
            TableKind::Readiness => "Readiness",
        }
    }

    pub fn header(&self) -> &'static [&'static str] {
        match self {
            TableKind::Body => &["Date", "Weight", "BMI", "Fat"],
            TableKind::Activities => &[
                "Date",
                "Calories Burned",
                "Steps",
                "Distance",
                "Floors",
                "Minutes Sedentary",
                "Minutes Lightly Active",
                "Minutes Fairly Active",
                "Minutes Very Active",
                "Activity Calories",
            ],
            TableKind::Sleep => &[
                "Start Time",
                "End Time",
                "Minutes Asleep",
                "Minutes Awake",
                "Number of Awakenings",
                "Time in Bed",
                "Minutes REM Sleep",
                "Minutes Light Sleep",
                "Minutes Deep Sleep",
            ],
            TableKind::RestingHeartRate => &["date", "resting_hr"],
            TableKind::HeartRateVariability => {
                &["date", "hrv_rmssd", "nrem_hr", "entropy", "deep_sleep_rmssd"]
            }
            TableKind::RespiratoryRate => &["date", "respiratory_rate"],
            TableKind::SpO2 => &["date", "avg_spo2", "min_spo2", "max_spo2"],
            TableKind::SleepScores => &[
                "date",
                "overall_score",
                "composition_score",
                "revitalization_score",
                "duration_score",
                "deep_sleep_min",
                "resting_hr",
            ],
            TableKind::Readiness => &[
                "date",
                "score",
                "level",
                "hrv_readiness",
                "rhr_readiness",
                "sleep_readiness",
            ],
        }
    }

    /// Whether the destination platform accepts this table as an import
    pub fn importable(&self) -> bool {
        matches!(
            self,
            TableKind::Body | TableKind::Activities | TableKind::Sleep
        )
    }
}

/// A recoverable problem with one input file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceWarning {
    pub path: PathBuf,
    pub message: String,
}

/// One written table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSummary {
    pub table: TableKind,
    pub file_name: String,
    pub path: PathBuf,
    /// Entries held by the accumulator (days or sleep sessions)
    pub records: usize,
    /// Data rows written below the header
    pub rows_written: usize,
    pub importable: bool,
}

/// Result of a full conversion run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionManifest {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub window: DateWindow,
    pub outputs: Vec<OutputSummary>,
    pub warnings: Vec<SourceWarning>,
}

impl ConversionManifest {
    pub fn output(&self, table: TableKind) -> Option<&OutputSummary> {
        self.outputs.iter().find(|o| o.table == table)
    }
}
