//! Sleep sessions and stage breakdowns
//!
//! Sessions come from `UserSleeps_*.csv`, keyed by `sleep_id`. Stage records
//! in `UserSleepStages_*.csv` are folded into per-session totals, but only for
//! sessions that were accepted by the date window.

use log::info;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use super::{fold_files, Warnings};
use crate::config::DateWindow;
use crate::normalizer::parse_instant;
use crate::scanner::scan;
use crate::types::{SleepSession, SleepStage, SleepStageTotals};

pub const SESSIONS_PATTERN: &str = "UserSleeps_*.csv";
pub const STAGES_PATTERN: &str = "UserSleepStages_*.csv";

/// Offset assumed when a session file has no offset column at all
pub const DEFAULT_UTC_OFFSET: &str = "+01:00";

/// Read every in-window sleep session. A later record with the same id
/// replaces the earlier one.
pub fn read_sleep_sessions(
    dir: &Path,
    window: &DateWindow,
    warnings: &mut Warnings,
) -> BTreeMap<String, SleepSession> {
    let mut sessions: BTreeMap<String, SleepSession> = BTreeMap::new();
    let files = scan(dir, SESSIONS_PATTERN);

    fold_files(&files, warnings, |ctx, row: SleepSessionRow| {
        let Some(start) = parse_instant(&row.sleep_start) else {
            return Ok(());
        };
        if !window.contains(start.date_naive()) {
            return Ok(());
        }

        let seq = sessions
            .get(&row.sleep_id)
            .map_or(sessions.len(), |earlier| earlier.seq);
        let session = SleepSession {
            id: row.sleep_id.clone(),
            seq,
            start,
            end: parse_instant(&row.sleep_end),
            minutes_asleep: ctx.whole("minutes_asleep", row.minutes_asleep.as_deref())?,
            minutes_awake: ctx.whole("minutes_awake", row.minutes_awake.as_deref())?,
            minutes_in_period: ctx.whole(
                "minutes_in_sleep_period",
                row.minutes_in_sleep_period.as_deref(),
            )?,
            start_raw: row.sleep_start,
            start_offset: row.start_utc_offset,
            end_offset: row.end_utc_offset,
        };
        sessions.insert(row.sleep_id, session);
        Ok(())
    });

    info!("Sleep: {} sessions in window", sessions.len());
    sessions
}

/// Fold stage records into totals for the known sessions.
///
/// Records for unknown ids, or with an unreadable start or end, are ignored.
pub fn accumulate_stages(
    dir: &Path,
    sessions: &BTreeMap<String, SleepSession>,
    warnings: &mut Warnings,
) -> BTreeMap<String, SleepStageTotals> {
    let mut totals: BTreeMap<String, SleepStageTotals> = BTreeMap::new();
    let files = scan(dir, STAGES_PATTERN);

    fold_files(&files, warnings, |_, row: SleepStageRow| {
        if !sessions.contains_key(&row.sleep_id) {
            return Ok(());
        }
        let (Some(start), Some(end)) = (
            parse_instant(&row.sleep_stage_start),
            parse_instant(&row.sleep_stage_end),
        ) else {
            return Ok(());
        };

        let minutes = (end - start).num_milliseconds() as f64 / 60_000.0;
        totals
            .entry(row.sleep_id)
            .or_default()
            .add(SleepStage::from_label(&row.sleep_stage_type), minutes);
        Ok(())
    });

    info!("Sleep stages: totals for {} sessions", totals.len());
    totals
}

fn default_utc_offset() -> String {
    DEFAULT_UTC_OFFSET.to_string()
}

// Export record structures

#[derive(Debug, Deserialize)]
struct SleepSessionRow {
    #[serde(default)]
    sleep_id: String,
    #[serde(default)]
    sleep_start: String,
    #[serde(default)]
    sleep_end: String,
    #[serde(default)]
    minutes_asleep: Option<String>,
    #[serde(default)]
    minutes_awake: Option<String>,
    #[serde(default)]
    minutes_in_sleep_period: Option<String>,
    #[serde(default = "default_utc_offset")]
    start_utc_offset: String,
    #[serde(default = "default_utc_offset")]
    end_utc_offset: String,
}

#[derive(Debug, Deserialize)]
struct SleepStageRow {
    #[serde(default)]
    sleep_id: String,
    #[serde(default)]
    sleep_stage_type: String,
    #[serde(default)]
    sleep_stage_start: String,
    #[serde(default)]
    sleep_stage_end: String,
}
