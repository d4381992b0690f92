//! Time source for the policy engine.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, FixedOffset, Local, NaiveTime, Offset, TimeZone, Utc};

/// Supplies the current instant and the server's local UTC offset.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Local UTC offset in effect at `at`.
    fn local_offset(&self, at: DateTime<Utc>) -> FixedOffset;
}

/// Wall clock in the server's local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn local_offset(&self, at: DateTime<Utc>) -> FixedOffset {
        Local.offset_from_utc_datetime(&at.naive_utc()).fix()
    }
}

/// Manually driven clock for tests.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Arc<RwLock<DateTime<Utc>>>,
    offset: FixedOffset,
}

impl FixedClock {
    /// Clock frozen at `now` in UTC.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self::with_offset(now, Utc.fix())
    }

    pub fn with_offset(now: DateTime<Utc>, offset: FixedOffset) -> Self {
        Self {
            now: Arc::new(RwLock::new(now)),
            offset,
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        if let Ok(mut guard) = self.now.write() {
            *guard = now;
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut guard) = self.now.write() {
            *guard += by;
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.read().map(|guard| *guard).unwrap_or_else(|e| *e.into_inner())
    }

    fn local_offset(&self, _at: DateTime<Utc>) -> FixedOffset {
        self.offset
    }
}

/// The local calendar day containing `now`, as a `[start, end)` range in UTC.
pub fn local_day_bounds(now: DateTime<Utc>, offset: FixedOffset) -> (DateTime<Utc>, DateTime<Utc>) {
    let local_date = now.with_timezone(&offset).date_naive();
    let local_midnight = local_date.and_time(NaiveTime::MIN);
    let start = local_midnight - offset_duration(offset);
    let start = Utc.from_utc_datetime(&start);
    (start, start + Duration::hours(24))
}

fn offset_duration(offset: FixedOffset) -> Duration {
    Duration::seconds(i64::from(offset.local_minus_utc()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_day_bounds_utc() {
        let (start, end) = local_day_bounds(utc("2024-03-10T15:30:00Z"), Utc.fix());
        assert_eq!(start, utc("2024-03-10T00:00:00Z"));
        assert_eq!(end, utc("2024-03-11T00:00:00Z"));
    }

    #[test]
    fn test_day_bounds_follow_local_midnight() {
        // 23:30 UTC is already the next day at UTC+2
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let (start, end) = local_day_bounds(utc("2024-03-10T23:30:00Z"), offset);
        assert_eq!(start, utc("2024-03-10T22:00:00Z"));
        assert_eq!(end, utc("2024-03-11T22:00:00Z"));

        let offset = FixedOffset::west_opt(5 * 3600).unwrap();
        let (start, _) = local_day_bounds(utc("2024-03-10T03:00:00Z"), offset);
        assert_eq!(start, utc("2024-03-09T05:00:00Z"));
    }

    #[test]
    fn test_fixed_clock_advance() {
        let clock = FixedClock::new(utc("2024-03-10T00:00:00Z"));
        clock.advance(Duration::minutes(90));
        assert_eq!(clock.now(), utc("2024-03-10T01:30:00Z"));
        clock.set(utc("2025-01-01T00:00:00Z"));
        assert_eq!(clock.now(), utc("2025-01-01T00:00:00Z"));
    }
}
