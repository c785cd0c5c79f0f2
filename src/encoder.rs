//! Destination CSV encoding
//!
//! This module renders reconciled tables into the import format: an unquoted
//! marker line, an unquoted header line, then data rows with every field
//! double-quoted. Numbers keep their numeric type up to this point and are
//! formatted here.

use csv::{QuoteStyle, Terminator, WriterBuilder};
use std::fs;
use std::path::Path;

use crate::error::ConvertError;
use crate::normalizer::local_display_time;
use crate::types::{
    ActivitySummary, BodyTable, DailySeries, OutputSummary, Reading, SleepRecord,
    SupplementaryTables, TableKind,
};

/// Date column format for date-keyed tables
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Local time format for sleep start and end
pub const SLEEP_TIME_FORMAT: &str = "%m/%d/%Y %H:%M";

/// A rendered table: rows of formatted fields for one output file
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    kind: TableKind,
    records: usize,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Empty table for `records` accumulated entries
    pub fn new(kind: TableKind, records: usize) -> Self {
        Self {
            kind,
            records,
            rows: Vec::with_capacity(records),
        }
    }

    pub fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn records(&self) -> usize {
        self.records
    }

    pub fn rows_written(&self) -> usize {
        self.rows.len()
    }

    /// Render marker, header and rows to bytes
    pub fn render(&self) -> Result<Vec<u8>, ConvertError> {
        let mut out = Vec::new();
        out.extend_from_slice(self.kind.marker().as_bytes());
        out.push(b'\n');
        out.extend_from_slice(self.kind.header().join(",").as_bytes());
        out.push(b'\n');

        let mut writer = WriterBuilder::new()
            .quote_style(QuoteStyle::Always)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(out);

        for row in &self.rows {
            writer.write_record(row).map_err(|source| self.encode_error(source))?;
        }

        writer
            .into_inner()
            .map_err(|e| self.encode_error(e.into_error().into()))
    }

    /// Write the table into `dir` under its fixed file name
    pub fn write_to(&self, dir: &Path) -> Result<OutputSummary, ConvertError> {
        let path = dir.join(self.kind.file_name());
        let bytes = self.render()?;
        fs::write(&path, bytes).map_err(|source| ConvertError::Write {
            path: path.clone(),
            source,
        })?;

        Ok(OutputSummary {
            table: self.kind,
            file_name: self.kind.file_name().to_string(),
            path,
            records: self.records,
            rows_written: self.rows.len(),
            importable: self.kind.importable(),
        })
    }

    fn encode_error(&self, source: csv::Error) -> ConvertError {
        ConvertError::Encode {
            table: self.kind.file_name(),
            source,
        }
    }
}

/// Body table, one row per date. Unset values are written as `0`.
pub fn encode_body(body: &BodyTable) -> Table {
    let mut table = Table::new(TableKind::Body, body.len());

    for (date, metric) in body {
        table.push(vec![
            date.format(DATE_FORMAT).to_string(),
            one_decimal(metric.weight_kg),
            one_decimal(metric.bmi),
            one_decimal(metric.fat_percent),
        ]);
    }

    table
}

/// Activities table, rows in the order given (ascending date)
pub fn encode_activities(summaries: &[ActivitySummary]) -> Table {
    let mut table = Table::new(TableKind::Activities, summaries.len());

    for day in summaries {
        table.push(vec![
            day.date.format(DATE_FORMAT).to_string(),
            day.calories_burned.to_string(),
            day.steps.to_string(),
            format!("{:.2}", day.distance_km),
            day.floors.to_string(),
            day.minutes_sedentary.to_string(),
            day.minutes_light.to_string(),
            day.minutes_fairly.to_string(),
            day.minutes_very.to_string(),
            day.activity_calories.to_string(),
        ]);
    }

    table
}

/// Sleep table. Sessions without a readable end are counted but not written.
pub fn encode_sleep(records: &[SleepRecord]) -> Table {
    let mut table = Table::new(TableKind::Sleep, records.len());

    for record in records {
        let session = &record.session;
        let Some(end) = session.end else {
            continue;
        };
        let start_local = local_display_time(session.start, &session.start_offset);
        let end_local = local_display_time(end, &session.end_offset);
        let stages = &record.stages;

        table.push(vec![
            start_local.format(SLEEP_TIME_FORMAT).to_string(),
            end_local.format(SLEEP_TIME_FORMAT).to_string(),
            session.minutes_asleep.to_string(),
            session.minutes_awake.to_string(),
            stages.awake_count.to_string(),
            session.minutes_in_period.to_string(),
            whole_minutes(stages.rem_minutes),
            whole_minutes(stages.light_minutes),
            whole_minutes(stages.deep_minutes),
        ]);
    }

    table
}

/// The six supplementary tables in output order
pub fn encode_supplementary(tables: &SupplementaryTables) -> Vec<Table> {
    vec![
        daily_table(TableKind::RestingHeartRate, &tables.resting_hr, |r| {
            vec![reading(&r.resting_hr)]
        }),
        daily_table(TableKind::HeartRateVariability, &tables.hrv, |r| {
            vec![
                r.hrv_rmssd.clone(),
                r.nrem_hr.clone(),
                r.entropy.clone(),
                r.deep_sleep_rmssd.clone(),
            ]
        }),
        daily_table(TableKind::RespiratoryRate, &tables.respiratory_rate, |r| {
            vec![r.respiratory_rate.clone()]
        }),
        daily_table(TableKind::SpO2, &tables.spo2, |r| {
            vec![r.avg_spo2.clone(), r.min_spo2.clone(), r.max_spo2.clone()]
        }),
        daily_table(TableKind::SleepScores, &tables.sleep_scores, |r| {
            vec![
                r.overall_score.clone(),
                r.composition_score.clone(),
                r.revitalization_score.clone(),
                r.duration_score.clone(),
                r.deep_sleep_min.clone(),
                r.resting_hr.clone(),
            ]
        }),
        daily_table(TableKind::Readiness, &tables.readiness, |r| {
            vec![
                r.score.clone(),
                r.level.clone(),
                r.hrv_readiness.clone(),
                r.rhr_readiness.clone(),
                r.sleep_readiness.clone(),
            ]
        }),
    ]
}

fn daily_table<T>(
    kind: TableKind,
    series: &DailySeries<T>,
    fields: impl Fn(&T) -> Vec<String>,
) -> Table {
    let mut table = Table::new(kind, series.len());

    for (date, record) in series {
        let mut row = vec![date.format(DATE_FORMAT).to_string()];
        row.extend(fields(record));
        table.push(row);
    }

    table
}

fn one_decimal(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.1}"),
        None => "0".to_string(),
    }
}

fn whole_minutes(minutes: f64) -> String {
    (minutes.round_ties_even() as i64).to_string()
}

fn reading(value: &Reading) -> String {
    match value {
        Reading::Value(v) => format!("{v:.1}"),
        Reading::Raw(text) => text.clone(),
    }
}
