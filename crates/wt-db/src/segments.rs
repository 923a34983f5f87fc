//! Event store: the append-only log of work segments.

use std::collections::HashMap;

use rusqlite::params;

use wt_core::{DayAggregate, WorkSegment};

use crate::days::increment_day_total;
use crate::{Database, DbError, segment_from_row};

/// A segment written by [`Database::record_segment`] and the day it was counted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordedSegment {
    pub segment: WorkSegment,
    /// The day aggregate after its total was incremented, or `None` if the
    /// segment was stored without a day.
    pub day: Option<DayAggregate>,
}

impl Database {
    /// Appends a segment and returns its id.
    pub fn add_segment(
        &mut self,
        start: i64,
        stop: i64,
        day_id: Option<i64>,
    ) -> Result<i64, DbError> {
        validate_segment(start, stop)?;
        if day_id.is_none() {
            tracing::warn!(start, stop, "storing work segment without a day");
        }
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO segments (start, stop, day_id) VALUES (?1, ?2, ?3)",
            params![start, stop, day_id],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Adds the segment's duration to its day and appends the segment, atomically.
    ///
    /// If `day_id` names a day that does not exist, the segment is stored
    /// without a day rather than failing.
    pub fn record_segment(
        &mut self,
        start: i64,
        stop: i64,
        day_id: Option<i64>,
    ) -> Result<RecordedSegment, DbError> {
        validate_segment(start, stop)?;
        let tx = self.conn_mut()?.transaction()?;

        let day = match day_id {
            Some(id) => {
                let day = increment_day_total(&tx, id, stop - start)?;
                if day.is_none() {
                    tracing::warn!(day_id = id, "day not found; storing segment without a day");
                }
                day
            }
            None => {
                tracing::warn!(start, stop, "storing work segment without a day");
                None
            }
        };

        tx.execute(
            "INSERT INTO segments (start, stop, day_id) VALUES (?1, ?2, ?3)",
            params![start, stop, day.map(|day| day.id)],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(RecordedSegment {
            segment: WorkSegment {
                id,
                start,
                stop,
                day_id: day.map(|day| day.id),
            },
            day,
        })
    }

    /// Lists all segments ordered by id.
    pub fn list_segments(&self) -> Result<Vec<WorkSegment>, DbError> {
        let mut stmt = self.conn()?.prepare(
            "
            SELECT id, start, stop, day_id
            FROM segments
            ORDER BY id ASC
            ",
        )?;
        let rows = stmt.query_map([], segment_from_row)?;
        let mut segments = Vec::new();
        for row in rows {
            segments.push(row?);
        }
        Ok(segments)
    }

    /// Lists segments whose start is at or after `timestamp`.
    pub fn segments_starting_at_or_after(&self, timestamp: i64) -> Result<Vec<WorkSegment>, DbError> {
        let mut stmt = self.conn()?.prepare(
            "
            SELECT id, start, stop, day_id
            FROM segments
            WHERE start >= ?1
            ORDER BY start ASC, id ASC
            ",
        )?;
        let rows = stmt.query_map([timestamp], segment_from_row)?;
        let mut segments = Vec::new();
        for row in rows {
            segments.push(row?);
        }
        Ok(segments)
    }

    /// Lists segments with ids in `start_id..=end_id`.
    pub fn segments_in_id_range(&self, start_id: i64, end_id: i64) -> Result<Vec<WorkSegment>, DbError> {
        let mut stmt = self.conn()?.prepare(
            "
            SELECT id, start, stop, day_id
            FROM segments
            WHERE id >= ?1 AND id <= ?2
            ORDER BY id ASC
            ",
        )?;
        let rows = stmt.query_map([start_id, end_id], segment_from_row)?;
        let mut segments = Vec::new();
        for row in rows {
            segments.push(row?);
        }
        Ok(segments)
    }

    /// Lists segments that were stored without a day.
    pub fn segments_without_day(&self) -> Result<Vec<WorkSegment>, DbError> {
        let mut stmt = self.conn()?.prepare(
            "
            SELECT id, start, stop, day_id
            FROM segments
            WHERE day_id IS NULL
            ORDER BY id ASC
            ",
        )?;
        let rows = stmt.query_map([], segment_from_row)?;
        let mut segments = Vec::new();
        for row in rows {
            segments.push(row?);
        }
        Ok(segments)
    }

    /// Sums segment durations per day id.
    pub fn segment_totals_by_day(&self) -> Result<HashMap<i64, i64>, DbError> {
        let mut stmt = self.conn()?.prepare(
            "
            SELECT day_id, SUM(stop - start)
            FROM segments
            WHERE day_id IS NOT NULL
            GROUP BY day_id
            ",
        )?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)))?;
        let mut totals = HashMap::new();
        for row in rows {
            let (day_id, total) = row?;
            totals.insert(day_id, total);
        }
        Ok(totals)
    }

    /// Sums the durations of segments starting at or after `timestamp`.
    pub fn segment_total_since(&self, timestamp: i64) -> Result<i64, DbError> {
        let total = self.conn()?.query_row(
            "SELECT COALESCE(SUM(stop - start), 0) FROM segments WHERE start >= ?1",
            [timestamp],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    /// Rewrites a segment's timestamps and day. Returns `false` if no such segment.
    ///
    /// Day totals are not adjusted.
    pub fn update_segment(
        &mut self,
        id: i64,
        start: i64,
        stop: i64,
        day_id: Option<i64>,
    ) -> Result<bool, DbError> {
        validate_segment(start, stop)?;
        let changed = self.conn()?.execute(
            "UPDATE segments SET start = ?1, stop = ?2, day_id = ?3 WHERE id = ?4",
            params![start, stop, day_id, id],
        )?;
        Ok(changed > 0)
    }

    /// Deletes a segment. Returns `false` if no such segment.
    ///
    /// Day totals are not adjusted.
    pub fn delete_segment(&mut self, id: i64) -> Result<bool, DbError> {
        let changed = self
            .conn()?
            .execute("DELETE FROM segments WHERE id = ?1", [id])?;
        Ok(changed > 0)
    }
}

fn validate_segment(start: i64, stop: i64) -> Result<(), DbError> {
    if stop > start {
        Ok(())
    } else {
        Err(DbError::InvalidSegment { start, stop })
    }
}
