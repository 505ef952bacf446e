use chrono::{DateTime, Duration, DurationRound, Timelike, Utc};

/// Truncates a timestamp to the start of its hour (minutes, seconds and
/// sub-second precision zeroed).
///
/// This is the merge key for valuation observations: two observations share a
/// bucket exactly when this function returns the same instant for both.
pub fn hour_bucket(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant
        .duration_trunc(Duration::hours(1))
        .unwrap_or_else(|_| {
            // Only reachable for instants at the edge of the representable range.
            instant
                .with_nanosecond(0)
                .and_then(|t| t.with_second(0))
                .and_then(|t| t.with_minute(0))
                .unwrap_or(instant)
        })
}

/// Returns the earliest instant included in a lookback window of `days` days
/// ending at `now`. Negative day counts are treated as zero; windows reaching
/// past the representable range start at its minimum.
pub fn window_start(now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    Duration::try_days(days.max(0))
        .and_then(|span| now.checked_sub_signed(span))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_hour_bucket_truncates_to_hour() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 5, 14, 59, 59).unwrap()
            + Duration::milliseconds(999);
        assert_eq!(
            hour_bucket(ts),
            Utc.with_ymd_and_hms(2024, 3, 5, 14, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_hour_bucket_is_idempotent() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 5, 14, 0, 0).unwrap();
        assert_eq!(hour_bucket(ts), ts);
        assert_eq!(hour_bucket(hour_bucket(ts)), ts);
    }

    #[test]
    fn test_window_start() {
        let now = Utc.with_ymd_and_hms(2024, 3, 31, 12, 0, 0).unwrap();
        assert_eq!(
            window_start(now, 30),
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
        );
        assert_eq!(window_start(now, -5), now);
    }

    #[test]
    fn test_window_start_saturates_for_huge_windows() {
        let now = Utc.with_ymd_and_hms(2024, 3, 31, 12, 0, 0).unwrap();
        assert_eq!(window_start(now, 1_000_000_000), DateTime::<Utc>::MIN_UTC);
        assert_eq!(window_start(now, i64::MAX), DateTime::<Utc>::MIN_UTC);
        // Bucketing the saturated start must not panic either.
        assert!(hour_bucket(window_start(now, i64::MAX)) <= now);
    }
}
