//! Date/time utilities for sharebox.
//!
//! Timestamps are stored in SQLite as fixed-width UTC text so that string
//! comparison in SQL agrees with chronological order.

use chrono::{DateTime, NaiveDateTime, Utc};

/// Storage format for all timestamp columns.
pub const DB_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Human-readable format used in upload responses.
pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format a UTC instant for storage.
pub fn to_db_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format(DB_TIMESTAMP_FORMAT).to_string()
}

/// Parse a stored timestamp.
///
/// Accepts both the six-digit fractional form written by [`to_db_timestamp`]
/// and plain `YYYY-MM-DD HH:MM:SS` as produced by SQLite's `datetime()`.
pub fn parse_db_timestamp(s: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Convert a database datetime string to RFC3339 format.
///
/// The database stores times in UTC, so the result carries a `Z` suffix.
/// Unparseable input is returned unchanged.
pub fn to_rfc3339(datetime_str: &str) -> String {
    match parse_db_timestamp(datetime_str) {
        Some(dt) => dt.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        None => datetime_str.to_string(),
    }
}

/// Format a stored timestamp with [`DISPLAY_FORMAT`].
pub fn to_display(datetime_str: &str) -> String {
    match parse_db_timestamp(datetime_str) {
        Some(dt) => dt.format(DISPLAY_FORMAT).to_string(),
        None => datetime_str.to_string(),
    }
}

/// Seconds since the Unix epoch as a float, with microsecond resolution.
pub fn unix_seconds(dt: &DateTime<Utc>) -> f64 {
    dt.timestamp() as f64 + f64::from(dt.timestamp_subsec_micros()) / 1_000_000.0
}
