//! Wall-clock sources.
//!
//! The scheduler never reads the system clock directly; it asks a
//! [`WallClock`]. [`SystemClock`] reads local time, [`ManualClock`] is set by
//! hand, and [`AnchoredClock`] derives wall time from the tokio clock so that
//! paused-time tests see wall time advance with their timers.

use chrono::{Local, NaiveDateTime, TimeDelta};
use std::sync::{Arc, Mutex};

/// Source of local wall-clock time with sub-second precision.
pub trait WallClock: Send {
    /// Current local wall time.
    fn now(&self) -> NaiveDateTime;
}

/// Reads the host's local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl WallClock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<NaiveDateTime>>,
}

impl ManualClock {
    /// Create a clock frozen at `now`.
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    /// Jump to `now`.
    pub fn set(&self, now: NaiveDateTime) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = now;
    }

    /// Move forward by `delta`.
    pub fn advance(&self, delta: std::time::Duration) {
        let delta = TimeDelta::from_std(delta).unwrap_or_else(|_| TimeDelta::zero());
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += delta;
    }
}

impl WallClock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Wall time pinned to a tokio [`Instant`](tokio::time::Instant).
///
/// `now()` is `origin + (tokio::time::Instant::now() - anchor)`, so it
/// advances with `tokio::time::advance` and paused-runtime auto-advance.
#[derive(Debug, Clone, Copy)]
pub struct AnchoredClock {
    origin: NaiveDateTime,
    anchor: tokio::time::Instant,
}

impl AnchoredClock {
    /// Anchor `origin` to the current tokio instant.
    pub fn starting_at(origin: NaiveDateTime) -> Self {
        Self {
            origin,
            anchor: tokio::time::Instant::now(),
        }
    }
}

impl WallClock for AnchoredClock {
    fn now(&self) -> NaiveDateTime {
        let elapsed = tokio::time::Instant::now().saturating_duration_since(self.anchor);
        let elapsed = TimeDelta::from_std(elapsed).unwrap_or_else(|_| TimeDelta::zero());
        self.origin + elapsed
    }
}

/// Build a wall time from parts. Returns `None` for out-of-range parts.
pub fn wall_time(h: u32, m: u32, s: u32, ms: u32) -> Option<NaiveDateTime> {
    chrono::NaiveDate::from_ymd_opt(2024, 1, 1)?.and_hms_milli_opt(h, m, s, ms)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use std::time::Duration;

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new(wall_time(10, 30, 45, 123).unwrap());
        let other = clock.clone();
        clock.advance(Duration::from_millis(877));
        assert_eq!(other.now(), wall_time(10, 30, 46, 0).unwrap());
        other.set(wall_time(0, 0, 0, 0).unwrap());
        assert_eq!(clock.now(), wall_time(0, 0, 0, 0).unwrap());
    }

    #[test]
    fn wall_time_rejects_out_of_range() {
        assert!(wall_time(24, 0, 0, 0).is_none());
        assert!(wall_time(23, 59, 59, 999).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn anchored_clock_follows_tokio_time() {
        let clock = AnchoredClock::starting_at(wall_time(10, 30, 45, 123).unwrap());
        assert_eq!(clock.now(), wall_time(10, 30, 45, 123).unwrap());
        tokio::time::advance(Duration::from_millis(877)).await;
        assert_eq!(clock.now(), wall_time(10, 30, 46, 0).unwrap());
    }
}
