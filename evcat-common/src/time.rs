//! Date and timestamp helpers
//!
//! Stored `start_date` values are free-form text written by many ingestion
//! sources. Everything here works on the text as written: the calendar date is
//! the leading `YYYY-MM-DD`, and no timezone conversion is applied.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, Utc};

/// Time-of-day written by sources that did not capture a start time
pub const UNKNOWN_TIME_SENTINEL: &str = "00:00:00";

/// Format used for every `updated_at` / `created_at` written by this crate
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Current timestamp in the stored text format
pub fn now_text() -> String {
    now().format(TIMESTAMP_FORMAT).to_string()
}

/// Local calendar date of the executing process
pub fn today_local() -> NaiveDate {
    Local::now().date_naive()
}

/// Calendar date of a stored start date, ignoring time-of-day
///
/// Returns `None` when the text does not begin with a valid `YYYY-MM-DD`.
pub fn calendar_date(start_date: &str) -> Option<NaiveDate> {
    let head = start_date.trim().get(..10)?;
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

/// Time-of-day portion of a stored start date (text after the `T` or space)
pub fn time_component(start_date: &str) -> Option<&str> {
    let trimmed = start_date.trim();
    let rest = trimmed.get(10..)?;
    let rest = rest.strip_prefix('T').or_else(|| rest.strip_prefix(' '))?;
    if rest.is_empty() {
        None
    } else {
        Some(rest)
    }
}

/// True when the start date carries the literal midnight sentinel
///
/// `2030-07-01T00:00:00+03:00` and `2030-07-01T00:00:00.000Z` carry it;
/// `2030-07-01T00:00:01` and a bare `2030-07-01` do not.
pub fn has_unknown_time(start_date: &str) -> bool {
    time_component(start_date)
        .and_then(|t| t.get(..UNKNOWN_TIME_SENTINEL.len()))
        .map(|hms| hms == UNKNOWN_TIME_SENTINEL)
        .unwrap_or(false)
}

/// Parse a stored timestamp (RFC 3339 or SQLite `YYYY-MM-DD HH:MM:SS`)
///
/// Naive forms are read as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc())
}
