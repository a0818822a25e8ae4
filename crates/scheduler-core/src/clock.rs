//! Wall-clock time, truncated to minute resolution.
//!
//! Every dispatch decision compares minute-truncated instants so that a
//! tick's "now" and a job's `nextRun` can be compared for exact equality
//! rather than drifting by sub-minute jitter.

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

/// Source of the current instant. Implementations must be cheap and
/// infallible; the dispatch loop calls `now_utc()` once per tick.
pub trait Clock: Send + Sync {
    fn now_utc(&self) -> DateTime<Utc>;

    /// Truncate an instant down to the start of its minute.
    fn truncate_to_minute(&self, t: DateTime<Utc>) -> DateTime<Utc> {
        truncate_to_minute(t)
    }
}

/// Truncate to minute resolution, dropping seconds and sub-second parts.
pub fn truncate_to_minute(t: DateTime<Utc>) -> DateTime<Utc> {
    let secs = t.timestamp() - (t.timestamp() % 60);
    Utc.timestamp_opt(secs, 0).single().unwrap_or(t)
}

/// Real wall-clock backed by the system time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Deterministic clock for tests: holds a fixed instant that can be
/// advanced explicitly. Never reads the system clock.
pub struct ManualClock {
    now_ms: AtomicI64,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now_ms: AtomicI64::new(start.timestamp_millis()),
        }
    }

    pub fn set(&self, t: DateTime<Utc>) {
        self.now_ms.store(t.timestamp_millis(), Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        self.now_ms.fetch_add(by.num_milliseconds(), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_utc(&self) -> DateTime<Utc> {
        let ms = self.now_ms.load(Ordering::SeqCst);
        Utc.timestamp_millis_opt(ms).single().expect("valid manual clock instant")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_truncate_to_minute() {
        let t = Utc.with_ymd_and_hms(2025, 1, 1, 10, 30, 47).unwrap();
        let truncated = truncate_to_minute(t);
        assert_eq!(truncated, Utc.with_ymd_and_hms(2025, 1, 1, 10, 30, 0).unwrap());
    }

    #[test]
    fn test_manual_clock_advance() {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let clock = ManualClock::new(start);
        assert_eq!(clock.now_utc(), start);

        clock.advance(Duration::hours(1));
        assert_eq!(clock.now_utc(), start + Duration::hours(1));

        clock.set(start);
        assert_eq!(clock.now_utc(), start);
    }

    #[test]
    fn test_system_clock_truncate_matches_free_fn() {
        let clock = SystemClock;
        let now = clock.now_utc();
        assert_eq!(clock.truncate_to_minute(now), truncate_to_minute(now));
    }
}
