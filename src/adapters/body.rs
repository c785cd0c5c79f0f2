//! Body composition sources
//!
//! Two weight sources exist in an archive. The global export JSON logs carry
//! weight in pounds together with BMI and body fat. The physical activity CSV
//! carries weight in grams only. A third family holds body fat readings alone.

use log::info;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::{
    dated, fold_files, grams_to_kg, pounds_to_kg, read_json_array, round_to, BodySource,
    NumericField, RowContext, Warnings,
};
use crate::config::DateWindow;
use crate::error::SourceError;
use crate::scanner::scan;
use crate::types::{BodyMetric, BodyTable, DailySeries};

pub const WEIGHT_JSON_PATTERN: &str = "weight-*.json";
pub const WEIGHT_CSV_PATTERN: &str = "weight.csv";
pub const BODY_FAT_PATTERN: &str = "body_fat_*.csv";

/// Weight logs from `Global Export Data` (pounds, with BMI and fat)
pub struct GlobalExportWeights {
    dir: PathBuf,
}

impl GlobalExportWeights {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl BodySource for GlobalExportWeights {
    fn name(&self) -> &'static str {
        "global export weight logs"
    }

    fn load(&self, window: &DateWindow, warnings: &mut Warnings) -> Option<BodyTable> {
        let mut table = BodyTable::new();

        for path in scan(&self.dir, WEIGHT_JSON_PATTERN) {
            if let Err(e) = fold_weight_log(&path, window, &mut table) {
                warnings.record(e);
            }
        }

        non_empty(table)
    }
}

fn fold_weight_log(
    path: &Path,
    window: &DateWindow,
    table: &mut BodyTable,
) -> Result<(), SourceError> {
    let entries: Vec<WeightLogEntry> = read_json_array(path)?;

    for (index, entry) in entries.into_iter().enumerate() {
        let Some(date) = dated(window, entry.date.as_deref()) else {
            continue;
        };
        let ctx = RowContext {
            path,
            record: index + 1,
        };

        let pounds = ctx.json_number("weight", entry.weight.as_ref())?;
        let bmi = ctx.json_number("bmi", entry.bmi.as_ref())?;
        let fat = ctx.json_number("fat", entry.fat.as_ref())?;

        table.insert(
            date,
            BodyMetric {
                weight_kg: Some(pounds_to_kg(pounds)),
                bmi: Some(round_to(bmi, 1)),
                fat_percent: Some(round_to(fat, 1)),
            },
        );
    }

    Ok(())
}

/// Weight readings from `weight.csv` (grams, no BMI or fat)
pub struct WeightGramsCsv {
    dir: PathBuf,
}

impl WeightGramsCsv {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl BodySource for WeightGramsCsv {
    fn name(&self) -> &'static str {
        "weight.csv"
    }

    fn load(&self, window: &DateWindow, warnings: &mut Warnings) -> Option<BodyTable> {
        let mut table = BodyTable::new();
        let files = scan(&self.dir, WEIGHT_CSV_PATTERN);

        fold_files(&files, warnings, |ctx, row: WeightGramsRow| {
            if let Some(date) = dated(window, row.timestamp.as_deref()) {
                let grams = ctx.number("weight grams", row.weight_grams.as_deref())?;
                table.insert(
                    date,
                    BodyMetric {
                        weight_kg: Some(grams_to_kg(grams)),
                        bmi: None,
                        fat_percent: None,
                    },
                );
            }
            Ok(())
        });

        non_empty(table)
    }
}

/// Body fat percentages keyed by date, last reading of a day wins
pub fn read_body_fat(
    dir: &Path,
    window: &DateWindow,
    warnings: &mut Warnings,
) -> DailySeries<f64> {
    let mut fat: DailySeries<f64> = DailySeries::new();
    let files = scan(dir, BODY_FAT_PATTERN);

    fold_files(&files, warnings, |ctx, row: BodyFatRow| {
        if let Some(date) = dated(window, row.timestamp.as_deref()) {
            let percent = ctx.number("body fat percentage", row.body_fat_percentage.as_deref())?;
            fat.insert(date, round_to(percent, 1));
        }
        Ok(())
    });

    info!("Body fat: {} days from {} files", fat.len(), files.len());
    fat
}

fn non_empty(table: BodyTable) -> Option<BodyTable> {
    (!table.is_empty()).then_some(table)
}

// Export record structures

#[derive(Debug, Deserialize)]
struct WeightLogEntry {
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    weight: Option<NumericField>,
    #[serde(default)]
    bmi: Option<NumericField>,
    #[serde(default)]
    fat: Option<NumericField>,
}

#[derive(Debug, Deserialize)]
struct WeightGramsRow {
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default, rename = "weight grams")]
    weight_grams: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BodyFatRow {
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default, rename = "body fat percentage")]
    body_fat_percentage: Option<String>,
}
