//! Timestamp utilities

use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Convert milliseconds to duration
pub fn millis_to_duration(millis: u64) -> std::time::Duration {
    std::time::Duration::from_millis(millis)
}

/// Human date label, e.g. "Sat, Oct 25"
pub fn display_date<Tz: chrono::TimeZone>(instant: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    instant.format("%a, %b %-d").to_string()
}

/// Human time label, e.g. "8:00 PM"
pub fn display_time<Tz: chrono::TimeZone>(instant: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    instant.format("%-I:%M %p").to_string()
}

/// Parse a "YYYY-MM-DD" calendar date
pub fn parse_wall_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

/// Parse "HH:MM:SS" or "HH:MM"
pub fn parse_wall_time(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .ok()
}

/// Resolve a wall-clock date and time in the local timezone
///
/// A missing time means midnight. Wall times skipped by a DST jump have no
/// instant; ambiguous ones resolve to the earlier occurrence.
pub fn local_wall_clock(date: NaiveDate, time: Option<NaiveTime>) -> Option<DateTime<Local>> {
    Local
        .from_local_datetime(&date.and_time(time.unwrap_or(NaiveTime::MIN)))
        .earliest()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::time::Duration;

    #[test]
    fn test_now_returns_valid_timestamp() {
        let timestamp = now();
        // After 2000-01-01, before 2100-01-01
        assert!(timestamp.timestamp() > 946_684_800);
        assert!(timestamp.timestamp() < 4_102_444_800);
    }

    #[tokio::test]
    async fn test_now_successive_calls_advance() {
        let time1 = now();
        tokio::time::sleep(Duration::from_millis(10)).await;
        let time2 = now();
        assert!(time2 > time1);
    }

    #[test]
    fn test_millis_to_duration() {
        assert_eq!(millis_to_duration(0), Duration::ZERO);
        assert_eq!(millis_to_duration(1000), Duration::from_secs(1));
        assert_eq!(millis_to_duration(3_600_000), Duration::from_secs(3600));
    }

    #[test]
    fn test_display_labels() {
        let instant = Utc.with_ymd_and_hms(2026, 10, 24, 20, 5, 0).unwrap();
        assert_eq!(display_date(&instant), "Sat, Oct 24");
        assert_eq!(display_time(&instant), "8:05 PM");
    }

    #[test]
    fn test_display_time_morning() {
        let instant = Utc.with_ymd_and_hms(2026, 1, 3, 9, 30, 0).unwrap();
        assert_eq!(display_date(&instant), "Sat, Jan 3");
        assert_eq!(display_time(&instant), "9:30 AM");
    }

    #[test]
    fn test_parse_wall_values() {
        assert_eq!(parse_wall_date(" 2099-06-01 "), NaiveDate::from_ymd_opt(2099, 6, 1));
        assert!(parse_wall_date("next friday").is_none());
        assert_eq!(parse_wall_time("20:00:00"), NaiveTime::from_hms_opt(20, 0, 0));
        assert_eq!(parse_wall_time("09:30"), NaiveTime::from_hms_opt(9, 30, 0));
        assert!(parse_wall_time("late").is_none());
    }

    #[test]
    fn test_local_wall_clock_keeps_wall_time() {
        let date = NaiveDate::from_ymd_opt(2099, 6, 1).unwrap();
        let evening = local_wall_clock(date, NaiveTime::from_hms_opt(20, 0, 0)).unwrap();
        assert_eq!(evening.date_naive(), date);
        assert_eq!(evening.time(), NaiveTime::from_hms_opt(20, 0, 0).unwrap());

        let midnight = local_wall_clock(date, None).unwrap();
        assert_eq!(midnight.time(), NaiveTime::MIN);
        assert_eq!(
            midnight.with_timezone(&Utc),
            Local
                .from_local_datetime(&date.and_time(NaiveTime::MIN))
                .earliest()
                .unwrap()
                .with_timezone(&Utc)
        );
    }
}
