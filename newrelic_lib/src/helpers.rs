//! Time helpers for metric query windows.

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Lookback used when a metrics call does not set `from`: 15 minutes (900 000 ms).
pub const DEFAULT_LOOKBACK: Duration = Duration::from_millis(15 * 60 * 1000);

/// Format time as ISO 8601 (UTC, millisecond precision) for the API.
pub fn format_time(dt: DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Parse ISO 8601 time string. A missing offset is read as UTC.
pub fn parse_time(s: &str) -> Result<DateTime<Utc>, String> {
    let s = s.trim();
    let parsed = DateTime::parse_from_rfc3339(s)
        .or_else(|_| DateTime::parse_from_rfc3339(&format!("{}Z", s)))
        .map_err(|e| format!("invalid timestamp {:?}: {}", s, e))?;
    Ok(parsed.with_timezone(&Utc))
}

/// Start of the default window ending at `now`.
pub fn default_from(now: DateTime<Utc>) -> DateTime<Utc> {
    now - chrono::Duration::milliseconds(DEFAULT_LOOKBACK.as_millis() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn lookback_is_fifteen_minutes() {
        assert_eq!(DEFAULT_LOOKBACK.as_millis(), 900_000);
        assert_eq!(DEFAULT_LOOKBACK, Duration::from_secs(15 * 60));
    }

    #[test]
    fn default_from_subtracts_lookback() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 10, 15, 0).unwrap();
        let from = default_from(now);
        assert_eq!(format_time(from), "2024-05-01T10:00:00.000Z");
        // 50 * 15 s would land at 10:02:30
        assert_ne!(format_time(from), "2024-05-01T10:02:30.000Z");
    }

    #[test]
    fn format_time_millis() {
        let dt = Utc.timestamp_millis_opt(1_714_558_500_123).unwrap();
        assert_eq!(format_time(dt), "2024-05-01T10:15:00.123Z");
    }

    #[test]
    fn parse_time_variants() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        assert_eq!(parse_time("2024-05-01T10:00:00Z").unwrap(), expected);
        assert_eq!(parse_time("2024-05-01T10:00:00").unwrap(), expected);
        assert_eq!(parse_time("2024-05-01T12:00:00+02:00").unwrap(), expected);
        assert!(parse_time("yesterday").is_err());
    }
}
