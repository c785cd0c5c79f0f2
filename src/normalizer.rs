//! Date and timestamp normalization
//!
//! The export mixes several encodings for the same calendar day:
//! - ISO instants with a `T` separator, with or without offset (`Z`, `+01:00`)
//! - plain `YYYY-MM-DD`
//! - US `MM/DD/YY`
//! - sleep timestamps such as `2025-12-03 21:12:30+0000`
//!
//! Every parser here returns `None` for text it cannot read. A row with an
//! unreadable timestamp is dropped by the caller, never fatal.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeDelta};

/// Datetime layouts tried once any offset has been split off
const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Date-only layouts accepted by the general ISO fallback
const ISO_DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y%m%d"];

/// Parse a calendar date from any supported encoding.
///
/// Rules are tried in order and the first that succeeds wins:
/// 1. text containing `T` is read as an instant and truncated to its date
/// 2. `YYYY-MM-DD`
/// 3. `MM/DD/YY`
/// 4. general ISO date or datetime
///
/// An instant keeps the calendar date of its own offset; it is not shifted
/// to UTC first.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    if value.contains('T') {
        return parse_instant(value).map(|dt| dt.date_naive());
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%m/%d/%y") {
        return Some(date);
    }

    parse_instant(value).map(|dt| dt.date_naive())
}

/// Parse an offset-aware instant.
///
/// Accepts `YYYY-MM-DD HH:MM:SS±HHMM` as exported for sleep records as well as
/// ISO forms (`T` separator, `±HH:MM`, trailing `Z`). Text without an offset is
/// taken as UTC.
pub fn parse_instant(raw: &str) -> Option<DateTime<FixedOffset>> {
    let value = raw.trim();
    let (body, offset_text) = split_offset(value);

    let offset = match offset_text {
        Some(text) => parse_offset(text)?,
        None => FixedOffset::east_opt(0)?,
    };

    let naive = parse_naive(body)?;
    naive.and_local_timezone(offset).single()
}

/// Whole-hour component of an offset string such as `+01:00` or `-0530`.
///
/// Minutes are dropped, so `-05:30` yields `-5` and `+05:45` yields `5`.
/// Empty or unreadable text yields `0`.
pub fn offset_whole_hours(offset: &str) -> i64 {
    let compact: String = offset.trim().chars().filter(|c| *c != ':').collect();
    compact
        .len()
        .checked_sub(2)
        .and_then(|end| compact.get(..end))
        .and_then(|hours| hours.parse::<i64>().ok())
        .unwrap_or(0)
}

/// Local display time of a session boundary.
///
/// Only the whole-hour part of `offset` is applied to the UTC instant. This
/// matches what the import format has always received; fractional-hour zones
/// land on the truncated hour.
pub fn local_display_time(instant: DateTime<FixedOffset>, offset: &str) -> NaiveDateTime {
    let utc = instant.naive_utc();
    TimeDelta::try_hours(offset_whole_hours(offset))
        .and_then(|shift| utc.checked_add_signed(shift))
        .unwrap_or(utc)
}

/// Split a trailing `Z` or numeric offset from the time portion
fn split_offset(value: &str) -> (&str, Option<&str>) {
    if let Some(body) = value.strip_suffix('Z').or_else(|| value.strip_suffix('z')) {
        return (body, Some("+00:00"));
    }

    // Signs inside the date part are separators, so only look after the time designator
    let Some(time_start) = value.find(|c: char| c == 'T' || c == ' ').map(|idx| idx + 1) else {
        return (value, None);
    };

    match value[time_start..].rfind(|c: char| c == '+' || c == '-') {
        Some(pos) => {
            let at = time_start + pos;
            (&value[..at], Some(&value[at..]))
        }
        None => (value, None),
    }
}

/// Parse `±HH:MM`, `±HHMM` or `±HH`
fn parse_offset(text: &str) -> Option<FixedOffset> {
    let text = text.trim();
    let (sign, digits) = match text.as_bytes().first()? {
        b'+' => (1, &text[1..]),
        b'-' => (-1, &text[1..]),
        _ => return None,
    };

    let digits: String = digits.chars().filter(|c| *c != ':').collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let (hours, minutes) = match digits.len() {
        2 => (digits.parse::<i32>().ok()?, 0),
        4 => (
            digits[..2].parse::<i32>().ok()?,
            digits[2..].parse::<i32>().ok()?,
        ),
        _ => return None,
    };

    if minutes >= 60 {
        return None;
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

fn parse_naive(body: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(body, fmt).ok())
        .or_else(|| {
            ISO_DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(body, fmt).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}
