//! Splitting a session into calendar-day slices.

use chrono::TimeZone;
use serde::{Deserialize, Serialize};

use crate::clock::{self, ClockError};

/// A slice of a session that lies within a single calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySpan {
    /// Local midnight of the day this slice belongs to.
    pub day_start: i64,
    pub start: i64,
    pub stop: i64,
}

impl DaySpan {
    /// Length of the slice in seconds.
    pub const fn duration(&self) -> i64 {
        self.stop - self.start
    }
}

/// Splits the session `[start, stop]` at every local midnight it crosses.
///
/// The first slice ends at 23:59:59 of the start day, each full day in between
/// becomes `[00:00:00, 23:59:59]`, and the last slice begins at local midnight
/// of the stop day. Zero-length slices are dropped, and a session with
/// `stop <= start` yields nothing.
pub fn split_into_day_spans<Tz: TimeZone>(
    tz: &Tz,
    start: i64,
    stop: i64,
) -> Result<Vec<DaySpan>, ClockError> {
    if stop <= start {
        return Ok(Vec::new());
    }

    let stop_day = clock::start_of_day(tz, stop)?;
    let mut cursor = start;
    let mut cursor_day = clock::start_of_day(tz, start)?;
    let mut spans = Vec::new();

    while cursor_day < stop_day {
        let end = clock::end_of_day(tz, cursor)?;
        push_non_empty(&mut spans, cursor_day, cursor, end);
        cursor = clock::start_of_next_day(tz, cursor)?;
        cursor_day = cursor;
    }
    push_non_empty(&mut spans, stop_day, cursor, stop);

    Ok(spans)
}

fn push_non_empty(spans: &mut Vec<DaySpan>, day_start: i64, start: i64, stop: i64) {
    if stop > start {
        spans.push(DaySpan {
            day_start,
            start,
            stop,
        });
    }
}
