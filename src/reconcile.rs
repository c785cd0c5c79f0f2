//! Cross-source reconciliation
//!
//! Merges the per-family accumulators into the tables that get written:
//! - body: first non-empty source in precedence order, then body fat applied
//! - activities: one summary per date seen in steps, calories or distance
//! - sleep: each session joined with its stage totals

use log::info;
use std::collections::{BTreeMap, BTreeSet};

use crate::adapters::{meters_to_km, ActivityCounters, BodySource, Warnings};
use crate::config::DateWindow;
use crate::types::{
    activity_calories, ActivitySummary, BodyTable, DailySeries, SleepRecord, SleepSession,
    SleepStageTotals,
};

/// Load the first source, in precedence order, that has any in-window record.
///
/// Lower-precedence sources are not read once one has produced data, so
/// records are never mixed across sources.
pub fn choose_primary(
    sources: &[&dyn BodySource],
    window: &DateWindow,
    warnings: &mut Warnings,
) -> BodyTable {
    sources
        .iter()
        .find_map(|source| {
            let table = source.load(window, warnings)?;
            info!("Body: {} days from {}", table.len(), source.name());
            Some(table)
        })
        .unwrap_or_default()
}

/// Overwrite the fat percentage with the body fat reading of the same day.
///
/// A day with only a body fat reading gets an entry with weight and BMI unset.
pub fn enrich_body_fat(table: &mut BodyTable, fat: &DailySeries<f64>) {
    for (date, percent) in fat {
        table.entry(*date).or_default().fat_percent = Some(*percent);
    }
}

/// Full body reconciliation: precedence, then body fat enrichment
pub fn reconcile_body(
    sources: &[&dyn BodySource],
    fat: &DailySeries<f64>,
    window: &DateWindow,
    warnings: &mut Warnings,
) -> BodyTable {
    let mut table = choose_primary(sources, window, warnings);
    enrich_body_fat(&mut table, fat);
    table
}

/// One summary per date present in steps, calories or distance
pub fn summarize_activity(counters: &ActivityCounters) -> Vec<ActivitySummary> {
    let dates: BTreeSet<_> = counters
        .steps
        .keys()
        .chain(counters.calories.keys())
        .chain(counters.distance_m.keys())
        .copied()
        .collect();

    dates
        .into_iter()
        .map(|date| {
            let count = |series: &DailySeries<i64>| series.get(&date).copied().unwrap_or(0);
            let calories_burned = counters
                .calories
                .get(&date)
                .map_or(0, |kcal| kcal.round_ties_even() as i64);

            ActivitySummary {
                date,
                calories_burned,
                steps: count(&counters.steps),
                distance_km: meters_to_km(counters.distance_m.get(&date).copied().unwrap_or(0.0)),
                floors: count(&counters.floors),
                minutes_sedentary: count(&counters.minutes_sedentary),
                minutes_light: count(&counters.minutes_light),
                minutes_fairly: count(&counters.minutes_fairly),
                minutes_very: count(&counters.minutes_very),
                activity_calories: activity_calories(calories_burned),
            }
        })
        .collect()
}

/// Join sessions with their stage totals, ordered by raw start text and
/// then by the order the sessions were first read.
///
/// A session with no stage records gets zero totals.
pub fn join_sleep(
    sessions: &BTreeMap<String, SleepSession>,
    stages: &BTreeMap<String, SleepStageTotals>,
) -> Vec<SleepRecord> {
    let mut records: Vec<SleepRecord> = sessions
        .values()
        .map(|session| SleepRecord {
            stages: stages.get(&session.id).copied().unwrap_or_default(),
            session: session.clone(),
        })
        .collect();

    records.sort_by(|a, b| {
        a.session
            .start_raw
            .cmp(&b.session.start_raw)
            .then_with(|| a.session.seq.cmp(&b.session.seq))
    });
    records
}
