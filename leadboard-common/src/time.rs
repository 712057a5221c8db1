//! Timestamp utilities

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Midnight (UTC) of the day containing `at`
pub fn start_of_day(at: DateTime<Utc>) -> DateTime<Utc> {
    Utc.from_utc_datetime(&at.date_naive().and_time(chrono::NaiveTime::MIN))
}

/// Parse a client-supplied timestamp
///
/// Accepts RFC 3339, `YYYY-MM-DDTHH:MM[:SS]`, `YYYY-MM-DD HH:MM[:SS]`
/// (taken as UTC) and a bare `YYYY-MM-DD` (UTC midnight).
pub fn parse_timestamp(input: &str) -> Option<DateTime<Utc>> {
    let s = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    const NAIVE_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ];
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .map(|d| Utc.from_utc_datetime(&d.and_time(chrono::NaiveTime::MIN)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_start_of_day_truncates_time() {
        let at = Utc.with_ymd_and_hms(2024, 3, 21, 17, 45, 12).unwrap();
        let midnight = start_of_day(at);
        assert_eq!(midnight.day(), 21);
        assert_eq!(midnight.hour(), 0);
        assert_eq!(midnight.minute(), 0);
        assert_eq!(midnight.second(), 0);
    }

    #[test]
    fn test_parse_rfc3339_with_offset() {
        let parsed = parse_timestamp("2024-03-21T10:22:00-05:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 3, 21, 15, 22, 0).unwrap());
    }

    #[test]
    fn test_parse_naive_forms() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 21, 10, 22, 0).unwrap();
        assert_eq!(parse_timestamp("2024-03-21T10:22").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-03-21 10:22:00").unwrap(), expected);
        assert_eq!(parse_timestamp(" 2024-03-21T10:22:00 ").unwrap(), expected);
    }

    #[test]
    fn test_parse_bare_date_is_midnight() {
        let parsed = parse_timestamp("2024-03-21").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 3, 21, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_timestamp("Mar 21").is_none());
        assert!(parse_timestamp("10:22 AM").is_none());
        assert!(parse_timestamp("2024-13-40").is_none());
        assert!(parse_timestamp("").is_none());
    }
}
