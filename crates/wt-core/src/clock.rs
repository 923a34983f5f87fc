//! Calendar arithmetic on epoch-second timestamps.
//!
//! Every function takes the time zone whose calendar defines "a day". The
//! binary passes [`chrono::Local`]; tests pin a fixed offset so results do not
//! depend on the machine running them.
//!
//! Day lengths come from the calendar, not from 86 400-second arithmetic, so
//! days around a DST transition are 23 or 25 hours long.

use std::fmt;

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, TimeDelta, TimeZone};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Longest DST gap we search across when local midnight does not exist.
const MAX_GAP_MINUTES: i64 = 24 * 60;

/// Calendar computation errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClockError {
    /// The timestamp cannot be placed on the calendar.
    #[error("timestamp {0} is outside the supported calendar range")]
    OutOfRange(i64),

    /// A trailing window was requested with zero days.
    #[error("a trailing window must cover at least one day")]
    EmptyWindow,
}

/// Year, month, and day of a timestamp in a given time zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DateComponents {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl fmt::Display for DateComponents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

impl From<NaiveDate> for DateComponents {
    fn from(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
            day: date.day(),
        }
    }
}

/// A span of consecutive calendar days ending today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Window {
    /// The current calendar day only.
    Today,
    /// Today plus the previous `n - 1` days.
    Days(u32),
}

impl Window {
    /// Today plus the previous six days.
    pub const WEEK: Self = Self::Days(7);
    /// Today plus the previous 29 days.
    pub const MONTH: Self = Self::Days(30);

    /// Number of calendar days covered, including today.
    pub const fn days(self) -> u32 {
        match self {
            Self::Today => 1,
            Self::Days(n) => n,
        }
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Today => f.write_str("today"),
            Self::Days(1) => f.write_str("1 day"),
            Self::Days(n) => write!(f, "{n} days"),
        }
    }
}

/// Local midnight of the day containing `timestamp`.
pub fn start_of_day<Tz: TimeZone>(tz: &Tz, timestamp: i64) -> Result<i64, ClockError> {
    let date = local_date(tz, timestamp)?;
    Ok(local_midnight(tz, date))
}

/// One second before the next local midnight.
pub fn end_of_day<Tz: TimeZone>(tz: &Tz, timestamp: i64) -> Result<i64, ClockError> {
    Ok(start_of_next_day(tz, timestamp)? - 1)
}

/// Local midnight of the calendar day after the one containing `timestamp`.
pub fn start_of_next_day<Tz: TimeZone>(tz: &Tz, timestamp: i64) -> Result<i64, ClockError> {
    let next = local_date(tz, timestamp)?
        .succ_opt()
        .ok_or(ClockError::OutOfRange(timestamp))?;
    Ok(local_midnight(tz, next))
}

/// Local midnight `days - 1` calendar days before the day containing `timestamp`.
///
/// A seven-day window is today plus the previous six days.
pub fn start_of_trailing_window<Tz: TimeZone>(
    tz: &Tz,
    timestamp: i64,
    days: u32,
) -> Result<i64, ClockError> {
    if days == 0 {
        return Err(ClockError::EmptyWindow);
    }
    let first = local_date(tz, timestamp)?
        .checked_sub_days(Days::new(u64::from(days - 1)))
        .ok_or(ClockError::OutOfRange(timestamp))?;
    Ok(local_midnight(tz, first))
}

/// First instant of `window` as seen from `now`.
pub fn window_start<Tz: TimeZone>(tz: &Tz, now: i64, window: Window) -> Result<i64, ClockError> {
    start_of_trailing_window(tz, now, window.days())
}

/// Calendar date of `timestamp`.
pub fn date_components<Tz: TimeZone>(tz: &Tz, timestamp: i64) -> Result<DateComponents, ClockError> {
    local_date(tz, timestamp).map(DateComponents::from)
}

fn local_date<Tz: TimeZone>(tz: &Tz, timestamp: i64) -> Result<NaiveDate, ClockError> {
    DateTime::from_timestamp(timestamp, 0)
        .map(|utc| utc.with_timezone(tz).date_naive())
        .ok_or(ClockError::OutOfRange(timestamp))
}

/// Converts local midnight of `date` to a timestamp.
///
/// An ambiguous midnight (clocks set back) resolves to the earlier instant.
/// A midnight skipped by a DST jump resolves to the first local time that
/// exists after it.
fn local_midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> i64 {
    let midnight = date.and_time(NaiveTime::MIN);
    for minutes in 0..=MAX_GAP_MINUTES {
        let Some(candidate) = midnight.checked_add_signed(TimeDelta::minutes(minutes)) else {
            break;
        };
        if let Some(resolved) = tz.from_local_datetime(&candidate).earliest() {
            return resolved.timestamp();
        }
    }
    midnight.and_utc().timestamp()
}
