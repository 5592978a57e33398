//! Hand angles for an analog dial.
//!
//! Angles are degrees clockwise from 12 o'clock, in `[0, 360)`.

use chrono::Timelike;

/// Angles of the three clock hands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandAngles {
    /// Hour hand: 30° per hour plus continuous minute/second drift.
    pub hour: f64,
    /// Minute hand: 6° per minute plus continuous second drift.
    pub minute: f64,
    /// Second hand: 6° per whole second.
    pub second: f64,
}

impl HandAngles {
    /// Angles for the time-of-day in `time`. Sub-second precision is ignored.
    pub fn at<T: Timelike>(time: &T) -> Self {
        let h = f64::from(time.hour() % 12);
        let m = f64::from(time.minute());
        let s = f64::from(time.second().min(59));

        Self {
            hour: h * 30.0 + m * 0.5 + s / 120.0,
            minute: m * 6.0 + s / 10.0,
            second: s * 6.0,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use chrono::NaiveTime;

    fn at(h: u32, m: u32, s: u32) -> HandAngles {
        HandAngles::at(&NaiveTime::from_hms_opt(h, m, s).unwrap())
    }

    #[test]
    fn midnight_is_straight_up() {
        let angles = at(0, 0, 0);
        assert_eq!(angles.hour, 0.0);
        assert_eq!(angles.minute, 0.0);
        assert_eq!(angles.second, 0.0);
    }

    #[test]
    fn half_past_ten() {
        let angles = at(10, 30, 0);
        assert_eq!(angles.hour, 315.0);
        assert_eq!(angles.minute, 180.0);
    }

    #[test]
    fn afternoon_wraps_to_twelve_hour_dial() {
        assert_eq!(at(22, 30, 0), at(10, 30, 0));
        assert_eq!(at(12, 0, 0).hour, 0.0);
    }

    #[test]
    fn seconds_drift_minute_and_hour_hands() {
        let angles = at(3, 15, 30);
        assert_eq!(angles.second, 180.0);
        assert_eq!(angles.minute, 93.0);
        assert_eq!(angles.hour, 97.75);
    }

    #[test]
    fn angles_stay_below_full_turn() {
        let angles = at(23, 59, 59);
        assert!(angles.hour < 360.0);
        assert!(angles.minute < 360.0);
        assert!(angles.second < 360.0);
    }
}
