//! Redraw boundary calculation.
//!
//! A boundary is the next top-of-minute (or top-of-second) wall instant.
//! The delay is always recomputed from the current time, never from the
//! previously intended boundary, so scheduling jitter does not accumulate.

use chrono::{NaiveDateTime, TimeDelta, Timelike};
use std::time::Duration;

use crate::config::DisplayMode;

const MILLIS_PER_SECOND: u64 = 1_000;
const MILLIS_PER_MINUTE: u64 = 60_000;

/// Next redraw instant and the delay until it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Boundary {
    /// Wall instant the redraw is aligned to.
    pub at: NaiveDateTime,
    /// Time from `now` until `at`. Never zero.
    pub delay: Duration,
}

impl Boundary {
    /// Delay in whole milliseconds.
    pub fn delay_ms(&self) -> u64 {
        self.delay.as_millis() as u64
    }
}

/// Compute the next boundary after `now` for `mode`.
///
/// Sub-millisecond precision is dropped first, so the delay is exactly
/// `60000 - (sec * 1000 + ms)` for [`DisplayMode::MinuteOnly`] and
/// `1000 - ms` for [`DisplayMode::WithSeconds`].
pub fn next_boundary(now: NaiveDateTime, mode: DisplayMode) -> Boundary {
    // Leap seconds report nanosecond >= 1e9; treat them as the last millisecond.
    let nanos = now.nanosecond().min(999_999_999);
    let millis = u64::from(nanos / 1_000_000);
    let sub_milli = i64::from(nanos % 1_000_000);

    let (elapsed, period) = match mode {
        DisplayMode::MinuteOnly => (
            u64::from(now.second()) * MILLIS_PER_SECOND + millis,
            MILLIS_PER_MINUTE,
        ),
        DisplayMode::WithSeconds => (millis, MILLIS_PER_SECOND),
    };
    let delay_ms = period - elapsed.min(period - 1);

    let truncated = now - TimeDelta::nanoseconds(sub_milli);
    let at = truncated + TimeDelta::milliseconds(delay_ms as i64);

    Boundary {
        at,
        delay: Duration::from_millis(delay_ms),
    }
}
