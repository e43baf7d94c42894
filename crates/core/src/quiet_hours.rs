//! Quiet-hours (do-not-disturb) window evaluation.
//!
//! A window is a pair of local times of day. When `start > end` the window
//! wraps past midnight (e.g. `22:00`–`08:00`). An empty window
//! (`start == end`) never matches.

use serde::{Deserialize, Serialize};

use crate::clock::TimeOfDay;
use crate::error::CoreError;

/// A configured do-not-disturb window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuietHours {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

impl QuietHours {
    pub fn new(start: TimeOfDay, end: TimeOfDay) -> Self {
        Self { start, end }
    }

    /// Parse a window from stored `HH:MM` strings.
    pub fn parse(start: &str, end: &str) -> Result<Self, CoreError> {
        Ok(Self::new(TimeOfDay::parse(start)?, TimeOfDay::parse(end)?))
    }

    /// Whether the window spans midnight.
    pub fn wraps_midnight(&self) -> bool {
        self.start > self.end
    }

    /// Whether `now` falls inside the window.
    pub fn contains(&self, now: TimeOfDay) -> bool {
        if self.wraps_midnight() {
            now >= self.start || now < self.end
        } else {
            self.start <= now && now < self.end
        }
    }
}

/// Evaluate a window given as raw `HH:MM` strings.
pub fn is_quiet_time(start: &str, end: &str, now: TimeOfDay) -> Result<bool, CoreError> {
    Ok(QuietHours::parse(start, end)?.contains(now))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(value: &str) -> TimeOfDay {
        TimeOfDay::parse(value).unwrap()
    }

    #[test]
    fn same_day_window_is_half_open() {
        let window = QuietHours::parse("13:00", "15:00").unwrap();
        assert!(!window.contains(t("12:59")));
        assert!(window.contains(t("13:00")));
        assert!(window.contains(t("14:59")));
        assert!(!window.contains(t("15:00")));
    }

    #[test]
    fn overnight_window_wraps_midnight() {
        let window = QuietHours::parse("22:00", "08:00").unwrap();
        assert!(window.wraps_midnight());
        assert!(window.contains(t("23:30")));
        assert!(window.contains(t("00:00")));
        assert!(window.contains(t("07:59")));
        assert!(!window.contains(t("08:00")));
        assert!(!window.contains(t("21:59")));
        assert!(window.contains(t("22:00")));
    }

    #[test]
    fn empty_window_never_matches() {
        let window = QuietHours::parse("09:00", "09:00").unwrap();
        for minute in 0..(24 * 60) {
            let now = TimeOfDay::new(minute / 60, minute % 60).unwrap();
            assert!(!window.contains(now), "empty window matched {now}");
        }
    }

    #[test]
    fn every_minute_matches_the_interval_definition() {
        let windows = [("01:15", "05:45"), ("23:00", "01:00"), ("00:00", "23:59")];
        for (start, end) in windows {
            let window = QuietHours::parse(start, end).unwrap();
            let (s, e) = (
                window.start.minutes_since_midnight(),
                window.end.minutes_since_midnight(),
            );
            for minute in 0..(24 * 60) {
                let now = TimeOfDay::new(minute / 60, minute % 60).unwrap();
                let expected = if s <= e {
                    s <= minute && minute < e
                } else {
                    minute >= s || minute < e
                };
                assert_eq!(window.contains(now), expected, "{start}-{end} at {now}");
            }
        }
    }

    #[test]
    fn is_quiet_time_rejects_malformed_bounds() {
        assert!(is_quiet_time("25:00", "08:00", t("01:00")).is_err());
        assert!(is_quiet_time("22:00", "08:00", t("01:00")).unwrap());
    }
}
