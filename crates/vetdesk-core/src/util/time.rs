//! Time handling for appointment slots.
//!
//! Scheduled times are stored and compared as UTC instants at millisecond
//! precision. Day filters operate on the server-local calendar day.

use chrono::{
    DateTime, Duration, Local, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone,
    Timelike, Utc,
};

/// ## Summary
/// Normalizes an instant to millisecond precision.
///
/// Conflict detection uses exact instant equality, so every datetime entering
/// the system is truncated to the same resolution before comparison or
/// storage.
#[must_use]
pub fn normalize_instant(at: DateTime<Utc>) -> DateTime<Utc> {
    let millis = at.nanosecond() / 1_000_000;
    at.with_nanosecond(millis * 1_000_000).unwrap_or(at)
}

/// ## Summary
/// Resolves a naive datetime in the server-local timezone to a UTC instant.
#[must_use]
pub fn local_to_utc(naive: NaiveDateTime) -> DateTime<Utc> {
    match Local.from_local_datetime(&naive) {
        LocalResult::Single(at) | LocalResult::Ambiguous(at, _) => at.with_timezone(&Utc),
        // DST gap: the wall-clock time does not exist locally
        LocalResult::None => Utc.from_utc_datetime(&naive),
    }
}

/// ## Summary
/// Parses a request datetime into a normalized UTC instant.
///
/// Accepts RFC 3339 (with offset), a naive `YYYY-MM-DDTHH:MM[:SS[.fff]]`
/// as produced by HTML `datetime-local` inputs (interpreted as server-local
/// time), or a bare `YYYY-MM-DD` (local midnight).
#[must_use]
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(normalize_instant(at.with_timezone(&Utc)));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(normalize_instant(local_to_utc(naive)));
        }
    }
    if let Ok(day) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(normalize_instant(local_to_utc(day.and_time(NaiveTime::MIN))));
    }
    None
}

/// ## Summary
/// Parses a calendar-day list filter.
///
/// Accepts `YYYY-MM-DD` directly, or any value `parse_instant` accepts
/// (the local calendar day of that instant is used).
#[must_use]
pub fn parse_day_filter(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_instant(raw).map(|at| at.with_timezone(&Local).date_naive()))
}

/// ## Summary
/// Returns the UTC range covering the server-local calendar day.
///
/// The range is `[00:00:00.000, 23:59:59.999)`: the end bound is one
/// millisecond before midnight and exclusive, so a midnight-exact
/// appointment is counted in exactly one day.
#[must_use]
pub fn local_day_bounds(day: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = day.and_time(NaiveTime::MIN);
    let end = start + Duration::days(1) - Duration::milliseconds(1);
    (local_to_utc(start), local_to_utc(end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_truncates_sub_millisecond_precision() {
        let at = Utc
            .with_ymd_and_hms(2025, 6, 1, 9, 0, 0)
            .single()
            .and_then(|at| at.with_nanosecond(123_456_789))
            .expect("valid datetime");

        let normalized = normalize_instant(at);
        assert_eq!(normalized.nanosecond(), 123_000_000);
    }

    #[test]
    fn parse_instant_accepts_rfc3339() {
        let at = parse_instant("2025-06-01T09:00:00Z").expect("parses");
        assert_eq!(at, Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap());

        let offset = parse_instant("2025-06-01T11:00:00+02:00").expect("parses");
        assert_eq!(offset, at);
    }

    #[test]
    fn parse_instant_accepts_datetime_local_forms() {
        let naive = NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();

        assert_eq!(parse_instant("2025-06-01T09:30"), Some(local_to_utc(naive)));
        assert_eq!(
            parse_instant("2025-06-01T09:30:00"),
            Some(local_to_utc(naive))
        );
    }

    #[test]
    fn parse_instant_rejects_garbage() {
        assert_eq!(parse_instant("not-a-date"), None);
        assert_eq!(parse_instant(""), None);
        assert_eq!(parse_instant("2025-13-40T09:00"), None);
    }

    #[test]
    fn parse_day_filter_accepts_date_and_datetime() {
        let day = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        assert_eq!(parse_day_filter("2025-03-10"), Some(day));

        let from_instant = parse_day_filter("2025-03-10T12:00").expect("parses");
        assert_eq!(from_instant, day);

        assert_eq!(parse_day_filter("whenever"), None);
    }

    #[test]
    fn day_bounds_cover_local_midnight_once() {
        let day = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let previous = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        let (start, end) = local_day_bounds(day);
        let (prev_start, prev_end) = local_day_bounds(previous);

        let midnight = local_to_utc(day.and_time(NaiveTime::MIN));
        assert!(midnight >= start && midnight < end);
        assert!(!(midnight >= prev_start && midnight < prev_end));
    }

    #[test]
    fn day_bounds_exclude_last_millisecond() {
        let day = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let (start, end) = local_day_bounds(day);

        let last = local_to_utc(
            day.and_hms_milli_opt(23, 59, 59, 999)
                .expect("valid wall-clock time"),
        );
        assert_eq!(last, end);
        assert!(!(last >= start && last < end));
    }
}
