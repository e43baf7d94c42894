//! Time-of-day values and the fixed reference timezone.
//!
//! Quiet-hours windows and report schedules are stored as `HH:MM` strings
//! in a single process-wide reference timezone. No per-tenant conversion
//! is performed.

use chrono::{FixedOffset, NaiveDateTime, NaiveTime, Offset, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// TimeOfDay
// ---------------------------------------------------------------------------

/// A wall-clock time of day with minute precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeOfDay {
    minutes: u16,
}

impl TimeOfDay {
    /// Build from hours and minutes, rejecting out-of-range values.
    pub fn new(hour: u16, minute: u16) -> Result<Self, CoreError> {
        if hour > 23 || minute > 59 {
            return Err(CoreError::Validation(format!(
                "time of day out of range: {hour:02}:{minute:02}"
            )));
        }
        Ok(Self {
            minutes: hour * 60 + minute,
        })
    }

    /// Parse an `HH:MM` string. A trailing `:SS` component is accepted and
    /// ignored so values written as `09:00:00` still parse.
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        let invalid =
            || CoreError::Validation(format!("invalid time of day '{value}', expected HH:MM"));

        let mut parts = value.trim().split(':');
        let hour = parts.next().ok_or_else(invalid)?;
        let minute = parts.next().ok_or_else(invalid)?;
        if let Some(seconds) = parts.next() {
            seconds.parse::<u16>().map_err(|_| invalid())?;
        }
        if parts.next().is_some() || hour.is_empty() || hour.len() > 2 || minute.len() != 2 {
            return Err(invalid());
        }

        let hour: u16 = hour.parse().map_err(|_| invalid())?;
        let minute: u16 = minute.parse().map_err(|_| invalid())?;
        Self::new(hour, minute)
    }

    pub fn from_naive_time(time: NaiveTime) -> Self {
        Self {
            minutes: (time.hour() * 60 + time.minute()) as u16,
        }
    }

    /// Minutes since midnight, `0..1440`.
    pub fn minutes_since_midnight(self) -> u16 {
        self.minutes
    }

    pub fn hour(self) -> u32 {
        u32::from(self.minutes / 60)
    }

    pub fn minute(self) -> u32 {
        u32::from(self.minutes % 60)
    }

    pub fn to_naive_time(self) -> NaiveTime {
        // Always in range: `minutes < 1440` is enforced by every constructor.
        NaiveTime::from_hms_opt(self.hour(), self.minute(), 0).unwrap_or(NaiveTime::MIN)
    }
}

impl std::fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

// ---------------------------------------------------------------------------
// ReferenceZone
// ---------------------------------------------------------------------------

/// The fixed UTC offset all stored times of day are interpreted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceZone {
    offset: FixedOffset,
}

impl ReferenceZone {
    pub fn utc() -> Self {
        Self { offset: Utc.fix() }
    }

    /// Build from an offset in minutes east of UTC (e.g. `180` for UTC+3).
    pub fn from_offset_minutes(minutes: i32) -> Result<Self, CoreError> {
        FixedOffset::east_opt(minutes * 60)
            .map(|offset| Self { offset })
            .ok_or_else(|| {
                CoreError::Validation(format!("UTC offset out of range: {minutes} minutes"))
            })
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Local wall-clock date/time of a UTC instant.
    pub fn local(&self, instant: Timestamp) -> NaiveDateTime {
        instant.with_timezone(&self.offset).naive_local()
    }

    /// Local time of day of a UTC instant.
    pub fn time_of_day(&self, instant: Timestamp) -> TimeOfDay {
        TimeOfDay::from_naive_time(self.local(instant).time())
    }

    /// Convert a local wall-clock date/time back to a UTC instant.
    ///
    /// A fixed offset has no gaps or folds, so the mapping is always unique.
    pub fn to_utc(&self, local: NaiveDateTime) -> Timestamp {
        Utc.from_utc_datetime(&local)
            - chrono::Duration::seconds(i64::from(self.offset.local_minus_utc()))
    }
}

impl Default for ReferenceZone {
    fn default() -> Self {
        Self::utc()
    }
}
