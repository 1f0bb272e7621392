//! Conversion of API time representations into canonical `YYYY-MM-DD` dates
//!
//! The record endpoints mix three encodings for the same concept:
//! - structured records: `{"year": 2025, "month": 7, "day": 31, "hour": 4, ...}`
//! - epoch seconds, usually as a numeric string (`"1753905600"`)
//! - ISO-ish date strings (`"2025-07-31"`, `"2025-07-31T04:00:00Z"`)
//!
//! Every function here is total: unparsable or missing input yields `None`,
//! and callers substitute a sentinel label. All conversions are done in UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

/// Canonical date format used in file names and season windows
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Convert any supported JSON time value into a canonical date string
///
/// Dispatches on the JSON type: objects are read as structured records,
/// strings as epoch-seconds-or-date, numbers as epoch seconds.
pub fn to_canonical_date(value: Option<&Value>) -> Option<String> {
    let value = value?;
    match value {
        Value::Object(_) => from_structured(value),
        Value::String(s) => from_epoch_or_date(s),
        Value::Number(n) => n.as_i64().and_then(from_epoch_seconds),
        _ => None,
    }
}

/// Convert a structured `{year, month, day, [hour, minute, second]}` record
///
/// Components may be JSON numbers or numeric strings. Only the date part is
/// kept; the time-of-day fields are accepted but not needed for the output.
pub fn from_structured(value: &Value) -> Option<String> {
    let year = component(value, "year")?;
    let month = component(value, "month")?;
    let day = component(value, "day")?;

    let date = NaiveDate::from_ymd_opt(
        i32::try_from(year).ok()?,
        u32::try_from(month).ok()?,
        u32::try_from(day).ok()?,
    )?;
    Some(format_date(date))
}

/// Parse an epoch-seconds numeric string or a date string
pub fn from_epoch_or_date(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if input.bytes().all(|b| b.is_ascii_digit()) {
        return input.parse::<i64>().ok().and_then(from_epoch_seconds);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(format_date(dt.with_timezone(&Utc).date_naive()));
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M:%S") {
        return Some(format_date(dt.date()));
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S") {
        return Some(format_date(dt.date()));
    }

    NaiveDate::parse_from_str(input, DATE_FORMAT)
        .ok()
        .map(format_date)
}

/// Convert epoch seconds into a UTC date string
pub fn from_epoch_seconds(seconds: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp(seconds, 0).map(|dt| format_date(dt.date_naive()))
}

/// Parse a canonical date string back into a [`NaiveDate`]
pub fn parse_canonical_date(input: &str) -> Option<NaiveDate> {
    if input.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(input, DATE_FORMAT).ok()
}

/// Format a date as `YYYY-MM-DD` with zero-padded month and day
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn component(value: &Value, key: &str) -> Option<i64> {
    match value.get(key)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
