//! Pipeline orchestration
//!
//! This module provides the public API for fitport.
//! It sequences the per-family stages over one Takeout archive and writes
//! every output table.

use log::info;
use std::fs;

use crate::adapters::{
    accumulate_stages, aggregate_activity, read_body_fat, read_sleep_sessions,
    read_supplementary, BodySource, GlobalExportWeights, Warnings, WeightGramsCsv,
};
use crate::config::{ConvertConfig, SourceLayout};
use crate::encoder::{encode_activities, encode_body, encode_sleep, encode_supplementary, Table};
use crate::error::ConvertError;
use crate::reconcile::{join_sleep, reconcile_body, summarize_activity};
use crate::types::{ConversionManifest, OutputSummary};

/// Convert a Takeout archive and write all tables.
///
/// # Example
/// ```ignore
/// let config = ConvertConfig::new("/data/Takeout/Fitbit");
/// let manifest = convert_takeout(&config)?;
/// println!("{} tables written", manifest.outputs.len());
/// ```
pub fn convert_takeout(config: &ConvertConfig) -> Result<ConversionManifest, ConvertError> {
    Converter::new(config.clone()).run()
}

/// Runs the conversion stages in order: body, activities, sleep, supplementary.
///
/// Stages are independent. Per-file failures become warnings in the
/// manifest; a missing input root or required subdirectory stops the run
/// before anything is written.
pub struct Converter {
    config: ConvertConfig,
    layout: SourceLayout,
}

impl Converter {
    pub fn new(config: ConvertConfig) -> Self {
        let layout = config.layout();
        Self { config, layout }
    }

    /// Run every stage and write its tables
    pub fn run(&self) -> Result<ConversionManifest, ConvertError> {
        self.layout.validate()?;

        let output_dir = &self.config.output_dir;
        fs::create_dir_all(output_dir).map_err(|source| ConvertError::OutputDir {
            path: output_dir.clone(),
            source,
        })?;

        info!("Converting {}", self.config.input_dir.display());
        info!("Output: {}", output_dir.display());
        info!("Date range: {}", self.config.window);

        let mut warnings = Warnings::default();
        let mut outputs = Vec::new();

        // Stage 1: body composition
        outputs.push(self.write(self.body_table(&mut warnings))?);

        // Stage 2: daily activity
        outputs.push(self.write(self.activities_table(&mut warnings))?);

        // Stage 3: sleep sessions
        outputs.push(self.write(self.sleep_table(&mut warnings))?);

        // Stage 4: supplementary metrics
        for table in self.supplementary_tables(&mut warnings) {
            outputs.push(self.write(table)?);
        }

        if !warnings.is_empty() {
            info!("{} input files skipped with warnings", warnings.len());
        }

        Ok(ConversionManifest {
            input_dir: self.config.input_dir.clone(),
            output_dir: output_dir.clone(),
            window: self.config.window,
            outputs,
            warnings: warnings.into_vec(),
        })
    }

    fn body_table(&self, warnings: &mut Warnings) -> Table {
        let window = &self.config.window;
        let rich = GlobalExportWeights::new(&self.layout.global_export);
        let fallback = WeightGramsCsv::new(&self.layout.physical_activity);
        let sources: [&dyn BodySource; 2] = [&rich, &fallback];

        let fat = read_body_fat(&self.layout.physical_activity, window, warnings);
        let body = reconcile_body(&sources, &fat, window, warnings);
        encode_body(&body)
    }

    fn activities_table(&self, warnings: &mut Warnings) -> Table {
        let counters =
            aggregate_activity(&self.layout.physical_activity, &self.config.window, warnings);
        encode_activities(&summarize_activity(&counters))
    }

    fn sleep_table(&self, warnings: &mut Warnings) -> Table {
        let dir = &self.layout.health_fitness;
        let sessions = read_sleep_sessions(dir, &self.config.window, warnings);
        let stages = accumulate_stages(dir, &sessions, warnings);
        encode_sleep(&join_sleep(&sessions, &stages))
    }

    fn supplementary_tables(&self, warnings: &mut Warnings) -> Vec<Table> {
        let tables = read_supplementary(&self.layout, &self.config.window, warnings);
        encode_supplementary(&tables)
    }

    fn write(&self, table: Table) -> Result<OutputSummary, ConvertError> {
        let summary = table.write_to(&self.config.output_dir)?;
        info!(
            "{}: {} records -> {}",
            summary.file_name,
            summary.records,
            summary.path.display()
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::test_support::write;
    use crate::config::{
        DateWindow, GLOBAL_EXPORT_DIR, HEALTH_FITNESS_DIR, PHYSICAL_ACTIVITY_DIR, SLEEP_SCORE_DIR,
    };
    use crate::types::TableKind;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    /// A small archive spanning January 2025 with one record in February
    fn archive(root: &Path) {
        let activity = root.join(PHYSICAL_ACTIVITY_DIR);
        let global = root.join(GLOBAL_EXPORT_DIR);
        let health = root.join(HEALTH_FITNESS_DIR);
        let score = root.join(SLEEP_SCORE_DIR);

        write(
            &global,
            "weight-2025-01-01.json",
            r#"[{"logId": 1, "weight": 150.0, "bmi": 22.86, "fat": 20.04, "date": "01/05/25"},
                {"logId": 2, "weight": 151.0, "bmi": 23.0, "fat": 20.0, "date": "02/05/25"}]"#,
        );
        write(
            &activity,
            "weight.csv",
            "timestamp,weight grams\n2025-01-05T07:00:00Z,70000\n",
        );
        write(
            &activity,
            "body_fat_2025-01.csv",
            "timestamp,body fat percentage\n2025-01-07T07:00:00Z,20.94\n",
        );
        write(
            &activity,
            "steps_2025-01-01.csv",
            "timestamp,steps\n2025-01-05T08:00:00Z,4000\n2025-01-05T09:00:00Z,4000\n2025-02-05T08:00:00Z,99\n",
        );
        write(
            &activity,
            "calories_2025-01-01.csv",
            "timestamp,calories\n2025-01-05T08:00:00Z,1100.25\n2025-01-05T09:00:00Z,1100.25\n",
        );
        write(
            &activity,
            "distance_2025-01-01.csv",
            "timestamp,distance\n2025-01-05T08:00:00Z,5000\n",
        );
        write(
            &activity,
            "daily_resting_heart_rate.csv",
            "timestamp,beats per minute\n2025-01-05,57.96\n",
        );
        write(
            &health,
            "UserSleeps_2025-01-01.csv",
            "sleep_id,minutes_in_sleep_period,minutes_asleep,minutes_awake,start_utc_offset,sleep_start,end_utc_offset,sleep_end
11,480,430,50,+01:00,2025-01-04 22:10:00+0000,+01:00,2025-01-05 06:10:00+0000
12,400,380,20,+01:00,2025-02-04 22:10:00+0000,+01:00,2025-02-05 05:00:00+0000
",
        );
        write(
            &health,
            "UserSleepStages_2025-01-01.csv",
            "sleep_id,sleep_stage_type,sleep_stage_start,sleep_stage_end
11,DEEP,2025-01-04 22:30:00+0000,2025-01-04 23:30:00+0000
12,DEEP,2025-02-04 22:30:00+0000,2025-02-04 23:30:00+0000
",
        );
        write(
            &score,
            "sleep_score.csv",
            "timestamp,overall_score,composition_score,revitalization_score,duration_score,deep_sleep_in_minutes,resting_heart_rate\n2025-01-05T06:10:00Z,80,20,20,40,60,57\n",
        );
    }

    fn january() -> DateWindow {
        DateWindow::between(date("2025-01-01"), date("2025-01-31")).unwrap()
    }

    fn read(path: &Path) -> String {
        std::fs::read_to_string(path).unwrap()
    }

    #[test]
    fn test_end_to_end_conversion() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("Fitbit");
        let output = tmp.path().join("out");
        archive(&input);

        let config = ConvertConfig::new(&input)
            .with_output_dir(&output)
            .with_window(january());
        let manifest = convert_takeout(&config).unwrap();

        assert_eq!(manifest.outputs.len(), TableKind::ALL.len());
        assert!(manifest.warnings.is_empty());

        assert_eq!(
            read(&output.join("garmin_body.csv")),
            "Body\nDate,Weight,BMI,Fat\n\"2025-01-05\",\"68.0\",\"22.9\",\"20.0\"\n\"2025-01-07\",\"0\",\"0\",\"20.9\"\n"
        );
        assert_eq!(
            read(&output.join("garmin_activities.csv")),
            "Activities\n\
             Date,Calories Burned,Steps,Distance,Floors,Minutes Sedentary,Minutes Lightly Active,Minutes Fairly Active,Minutes Very Active,Activity Calories\n\
             \"2025-01-05\",\"2200\",\"8000\",\"5.00\",\"0\",\"0\",\"0\",\"0\",\"0\",\"700\"\n"
        );
        assert_eq!(
            read(&output.join("garmin_sleep.csv")),
            "Sleep\n\
             Start Time,End Time,Minutes Asleep,Minutes Awake,Number of Awakenings,Time in Bed,Minutes REM Sleep,Minutes Light Sleep,Minutes Deep Sleep\n\
             \"01/04/2025 23:10\",\"01/05/2025 07:10\",\"430\",\"50\",\"0\",\"480\",\"0\",\"0\",\"60\"\n"
        );
        assert_eq!(
            read(&output.join("garmin_supplement_resting_hr.csv")),
            "RestingHeartRate\ndate,resting_hr\n\"2025-01-05\",\"58.0\"\n"
        );

        let sleep = manifest.output(TableKind::Sleep).unwrap();
        assert_eq!(sleep.records, 1);
        assert_eq!(
            manifest.output(TableKind::SpO2).unwrap().rows_written,
            0
        );
    }

    #[test]
    fn test_rerun_is_byte_identical() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("Fitbit");
        archive(&input);

        let first_out = tmp.path().join("first");
        let second_out = tmp.path().join("second");
        let config = ConvertConfig::new(&input).with_output_dir(&first_out);
        convert_takeout(&config).unwrap();
        convert_takeout(&config.clone().with_output_dir(&second_out)).unwrap();

        for kind in TableKind::ALL {
            let first = std::fs::read(first_out.join(kind.file_name())).unwrap();
            let second = std::fs::read(second_out.join(kind.file_name())).unwrap();
            assert_eq!(first, second, "{} differs between runs", kind.file_name());
        }
    }

    #[test]
    fn test_unbounded_window_includes_all_dates() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("Fitbit");
        archive(&input);

        let manifest = convert_takeout(&ConvertConfig::new(&input)).unwrap();

        assert_eq!(manifest.output_dir, tmp.path());
        assert_eq!(manifest.output(TableKind::Body).unwrap().records, 3);
        assert_eq!(manifest.output(TableKind::Activities).unwrap().records, 2);
        assert_eq!(manifest.output(TableKind::Sleep).unwrap().records, 2);
    }

    #[test]
    fn test_bad_file_becomes_warning() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("Fitbit");
        archive(&input);
        write(
            &input.join(PHYSICAL_ACTIVITY_DIR),
            "steps_2025-01-02.csv",
            "timestamp,steps\n2025-01-06T08:00:00Z,lots\n",
        );

        let config = ConvertConfig::new(&input)
            .with_output_dir(tmp.path().join("out"))
            .with_window(january());
        let manifest = convert_takeout(&config).unwrap();

        assert_eq!(manifest.warnings.len(), 1);
        assert!(manifest.warnings[0].path.ends_with("steps_2025-01-02.csv"));
        assert_eq!(manifest.output(TableKind::Activities).unwrap().records, 1);
    }

    #[test]
    fn test_missing_required_subdirectory_writes_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("Fitbit");
        std::fs::create_dir(&input).unwrap();
        let output = tmp.path().join("out");

        let err = convert_takeout(&ConvertConfig::new(&input).with_output_dir(&output))
            .unwrap_err();

        assert!(matches!(err, ConvertError::MissingSubdirectory(_)));
        assert!(!output.exists());
    }
}
