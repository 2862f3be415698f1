// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.
//!
//! Timestamps are stored as RFC3339 strings with a `Z` suffix and second
//! precision, so Firestore range queries on them sort chronologically.

use crate::error::{AppError, Result};
use chrono::{DateTime, Duration, NaiveDate, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Current time in storage format.
pub fn now_rfc3339() -> String {
    format_utc_rfc3339(Utc::now())
}

/// Parse an RFC3339 timestamp (any offset) into UTC.
pub fn parse_utc(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Parse a client-supplied timestamp and re-format it in storage format.
///
/// Accepts full RFC3339 or a bare `YYYY-MM-DD` date (midnight UTC).
pub fn normalize_input(field: &str, raw: &str) -> Result<String> {
    if let Some(dt) = parse_utc(raw) {
        return Ok(format_utc_rfc3339(dt));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|d| format_utc_rfc3339(d.and_utc()))
        .ok_or_else(|| {
            AppError::BadRequest(format!(
                "Invalid '{}': must be RFC3339 datetime or YYYY-MM-DD",
                field
            ))
        })
}

/// Start and end (exclusive) of the UTC day containing `at`, in storage format.
pub fn utc_day_bounds(at: DateTime<Utc>) -> (String, String) {
    let start = at.date_naive().and_hms_opt(0, 0, 0).unwrap_or_default().and_utc();
    let end = start + Duration::days(1);
    (format_utc_rfc3339(start), format_utc_rfc3339(end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_normalize_input_accepts_offsets_and_dates() {
        assert_eq!(
            normalize_input("date_limit", "2026-03-01T10:30:00-03:00").unwrap(),
            "2026-03-01T13:30:00Z"
        );
        assert_eq!(
            normalize_input("date_limit", "2026-03-01").unwrap(),
            "2026-03-01T00:00:00Z"
        );
        assert!(matches!(
            normalize_input("date_limit", "next tuesday"),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_utc_day_bounds() {
        let at = Utc.with_ymd_and_hms(2026, 5, 10, 17, 45, 0).unwrap();
        let (start, end) = utc_day_bounds(at);
        assert_eq!(start, "2026-05-10T00:00:00Z");
        assert_eq!(end, "2026-05-11T00:00:00Z");
    }

    #[test]
    fn test_storage_format_sorts_chronologically() {
        let earlier = format_utc_rfc3339(Utc.with_ymd_and_hms(2026, 1, 9, 23, 0, 0).unwrap());
        let later = format_utc_rfc3339(Utc.with_ymd_and_hms(2026, 1, 10, 1, 0, 0).unwrap());
        assert!(earlier < later);
    }
}
