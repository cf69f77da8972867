// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time parsing and formatting.

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Current calendar date in UTC. Overdue checks compare against this,
/// never against a full timestamp.
pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

/// Parse a calendar date from `YYYY-MM-DD` or a full RFC3339 timestamp.
///
/// Timestamps are converted to UTC before the date is taken.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok().or_else(|| {
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.with_timezone(&Utc).date_naive())
    })
}

/// Parse a time of day from `HH:MM` or `HH:MM:SS`.
pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

/// Parse a timestamp from RFC3339, or a bare date taken as UTC midnight.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_accepts_plain_and_rfc3339() {
        let expected = NaiveDate::from_ymd_opt(2025, 7, 14).unwrap();
        assert_eq!(parse_date("2025-07-14"), Some(expected));
        assert_eq!(parse_date("2025-07-14T08:30:00Z"), Some(expected));
        // 23:30 at -02:00 is already the next day in UTC
        assert_eq!(
            parse_date("2025-07-13T23:30:00-02:00"),
            Some(expected)
        );
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert_eq!(parse_date("not-a-date"), None);
        assert_eq!(parse_date("2025-13-40"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_parse_time() {
        assert_eq!(parse_time("07:45"), NaiveTime::from_hms_opt(7, 45, 0));
        assert_eq!(parse_time("07:45:30"), NaiveTime::from_hms_opt(7, 45, 30));
        assert_eq!(parse_time("25:00"), None);
    }

    #[test]
    fn test_parse_timestamp_from_date() {
        let ts = parse_timestamp("2025-01-02").unwrap();
        assert_eq!(format_utc_rfc3339(ts), "2025-01-02T00:00:00Z");
    }
}
