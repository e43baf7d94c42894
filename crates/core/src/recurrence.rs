//! Scheduled-report recurrence rules and next-run arithmetic.
//!
//! All schedule times are wall-clock times in the [`ReferenceZone`]. The
//! next run computed by [`ReportSchedule::next_after`] is always strictly
//! after the supplied `now`.

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::clock::{ReferenceZone, TimeOfDay};
use crate::error::CoreError;
use crate::types::Timestamp;

pub const RECURRENCE_DAILY: &str = "daily";
pub const RECURRENCE_WEEKLY: &str = "weekly";
pub const RECURRENCE_MONTHLY: &str = "monthly";
pub const RECURRENCE_CUSTOM: &str = "custom";

/// Weekly reports default to Sunday.
pub const DEFAULT_WEEKDAY: i16 = 0;

/// Monthly reports default to the first of the month.
pub const DEFAULT_MONTH_DAY: i16 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recurrence {
    Daily,
    Weekly,
    Monthly,
    /// Merchant-defined cadence; scheduled like `Daily`.
    Custom,
}

impl Recurrence {
    pub fn as_str(self) -> &'static str {
        match self {
            Recurrence::Daily => RECURRENCE_DAILY,
            Recurrence::Weekly => RECURRENCE_WEEKLY,
            Recurrence::Monthly => RECURRENCE_MONTHLY,
            Recurrence::Custom => RECURRENCE_CUSTOM,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            RECURRENCE_DAILY => Some(Recurrence::Daily),
            RECURRENCE_WEEKLY => Some(Recurrence::Weekly),
            RECURRENCE_MONTHLY => Some(Recurrence::Monthly),
            RECURRENCE_CUSTOM => Some(Recurrence::Custom),
            _ => None,
        }
    }

    /// Length of the trailing metrics window a report of this kind covers.
    pub fn trailing_days(self) -> u32 {
        match self {
            Recurrence::Daily => 1,
            Recurrence::Weekly | Recurrence::Custom => 7,
            Recurrence::Monthly => 30,
        }
    }
}

// ---------------------------------------------------------------------------
// ReportSchedule
// ---------------------------------------------------------------------------

/// A validated recurrence rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportSchedule {
    pub recurrence: Recurrence,
    /// Day of week (0 = Sunday) for weekly, day of month (1-31) for monthly.
    pub day: i16,
    pub time: TimeOfDay,
}

impl ReportSchedule {
    /// Validate raw report columns into a schedule.
    pub fn new(recurrence: Recurrence, day: Option<i16>, time: TimeOfDay) -> Result<Self, CoreError> {
        let day = match recurrence {
            Recurrence::Weekly => {
                let day = day.unwrap_or(DEFAULT_WEEKDAY);
                if !(0..=6).contains(&day) {
                    return Err(CoreError::Validation(format!(
                        "weekly schedule day must be 0-6 (0 = Sunday), got {day}"
                    )));
                }
                day
            }
            Recurrence::Monthly => {
                let day = day.unwrap_or(DEFAULT_MONTH_DAY);
                if !(1..=31).contains(&day) {
                    return Err(CoreError::Validation(format!(
                        "monthly schedule day must be 1-31, got {day}"
                    )));
                }
                day
            }
            Recurrence::Daily | Recurrence::Custom => 0,
        };

        Ok(Self {
            recurrence,
            day,
            time,
        })
    }

    /// Parse from stored column values.
    pub fn parse(recurrence: &str, day: Option<i16>, time: &str) -> Result<Self, CoreError> {
        let recurrence = Recurrence::parse(recurrence).ok_or_else(|| {
            CoreError::Validation(format!("unknown report recurrence '{recurrence}'"))
        })?;
        Self::new(recurrence, day, TimeOfDay::parse(time)?)
    }

    /// Next run strictly after `now`.
    ///
    /// - daily / custom: today at `time`, rolled to tomorrow if not after now.
    /// - weekly: next `day` of week at `time` strictly after now.
    /// - monthly: this month's `day` at `time`, rolled to next month if not
    ///   after now. Days past the end of a short month clamp to its last day.
    pub fn next_after(&self, now: Timestamp, zone: &ReferenceZone) -> Timestamp {
        let today = zone.local(now).date();

        match self.recurrence {
            Recurrence::Daily | Recurrence::Custom => {
                let candidate = self.at(today, zone);
                if candidate > now {
                    candidate
                } else {
                    self.at(add_days(today, 1), zone)
                }
            }
            Recurrence::Weekly => {
                let current = today.weekday().num_days_from_sunday() as i64;
                let days_ahead = (i64::from(self.day) - current).rem_euclid(7) as u64;
                let candidate = self.at(add_days(today, days_ahead), zone);
                if candidate > now {
                    candidate
                } else {
                    self.at(add_days(today, days_ahead + 7), zone)
                }
            }
            Recurrence::Monthly => {
                let candidate = self.at(month_day(today.year(), today.month(), self.day), zone);
                if candidate > now {
                    candidate
                } else {
                    let (year, month) = next_month(today.year(), today.month());
                    self.at(month_day(year, month, self.day), zone)
                }
            }
        }
    }

    fn at(&self, date: NaiveDate, zone: &ReferenceZone) -> Timestamp {
        zone.to_utc(NaiveDateTime::new(date, self.time.to_naive_time()))
    }
}

fn add_days(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_add_days(Days::new(days)).unwrap_or(NaiveDate::MAX)
}

fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next) = next_month(year, month);
    NaiveDate::from_ymd_opt(next_year, next, 1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
        .unwrap_or(28)
}

/// The given day of the month, clamped to the month's length.
fn month_day(year: i32, month: u32, day: i16) -> NaiveDate {
    let day = (day.max(1) as u32).min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MAX)
}
