//! Cross-checks day totals against the segment log.

use serde::Serialize;

use wt_core::{DayAggregate, WorkSegment};
use wt_db::{Database, DbError};

/// A day whose stored total differs from the sum of its segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayMismatch {
    pub day: DayAggregate,
    pub segment_total: i64,
}

impl DayMismatch {
    /// Stored total minus segment total.
    pub const fn difference(&self) -> i64 {
        self.day.total_worked - self.segment_total
    }
}

/// Result of [`check_consistency`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConsistencyReport {
    pub days_checked: usize,
    pub mismatches: Vec<DayMismatch>,
    /// Segments stored without a day; their time is in no day total.
    pub unattributed: Vec<WorkSegment>,
}

impl ConsistencyReport {
    pub fn is_consistent(&self) -> bool {
        self.mismatches.is_empty()
    }
}

/// Compares every day's total with the durations of the segments linked to it.
pub fn check_consistency(db: &Database) -> Result<ConsistencyReport, DbError> {
    let days = db.list_days_most_recent_first()?;
    let segment_totals = db.segment_totals_by_day()?;

    let mismatches = days
        .iter()
        .filter_map(|day| {
            let segment_total = segment_totals.get(&day.id).copied().unwrap_or(0);
            (segment_total != day.total_worked).then_some(DayMismatch {
                day: *day,
                segment_total,
            })
        })
        .collect();

    Ok(ConsistencyReport {
        days_checked: days.len(),
        mismatches,
        unattributed: db.segments_without_day()?,
    })
}
