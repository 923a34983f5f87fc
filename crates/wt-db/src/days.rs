//! Day aggregate store: one running total per local calendar day.

use rusqlite::{Connection, OptionalExtension, Params, params};

use wt_core::{DateComponents, DayAggregate};

use crate::{Database, DbError, day_from_row};

impl Database {
    /// Looks up a day by id.
    pub fn day_by_id(&self, id: i64) -> Result<Option<DayAggregate>, DbError> {
        self.single_day(
            "
            SELECT id, start_of_day, year, month, day, total_worked
            FROM days
            WHERE id = ?1
            ",
            [id],
        )
    }

    /// Looks up a day by its calendar date.
    pub fn day_by_date(&self, date: DateComponents) -> Result<Option<DayAggregate>, DbError> {
        self.single_day(
            "
            SELECT id, start_of_day, year, month, day, total_worked
            FROM days
            WHERE year = ?1 AND month = ?2 AND day = ?3
            ORDER BY start_of_day ASC
            ",
            params![date.year, date.month, date.day],
        )
    }

    /// Looks up a day by the timestamp of its local midnight.
    pub fn day_by_start_of_day(&self, start_of_day: i64) -> Result<Option<DayAggregate>, DbError> {
        self.single_day(
            "
            SELECT id, start_of_day, year, month, day, total_worked
            FROM days
            WHERE start_of_day = ?1
            ",
            [start_of_day],
        )
    }

    /// Creates a day with a zero total.
    ///
    /// Fails if a day with the same `start_of_day` already exists; callers look
    /// the day up first.
    pub fn create_day(
        &mut self,
        start_of_day: i64,
        date: DateComponents,
    ) -> Result<DayAggregate, DbError> {
        let conn = self.conn()?;
        conn.execute(
            "
            INSERT INTO days (start_of_day, year, month, day, total_worked)
            VALUES (?1, ?2, ?3, ?4, 0)
            ",
            params![start_of_day, date.year, date.month, date.day],
        )?;
        Ok(DayAggregate {
            id: conn.last_insert_rowid(),
            start_of_day,
            date,
            total_worked: 0,
        })
    }

    /// Atomically adds `duration` seconds to a day's total.
    ///
    /// Returns the updated day, or `None` if no day has that id.
    pub fn add_to_day_total(
        &mut self,
        day_id: i64,
        duration: i64,
    ) -> Result<Option<DayAggregate>, DbError> {
        if duration < 0 {
            return Err(DbError::NegativeDuration(duration));
        }
        Ok(increment_day_total(self.conn()?, day_id, duration)?)
    }

    /// Lists days whose local midnight is at or after `timestamp`, oldest first.
    pub fn days_starting_at_or_after(&self, timestamp: i64) -> Result<Vec<DayAggregate>, DbError> {
        let mut stmt = self.conn()?.prepare(
            "
            SELECT id, start_of_day, year, month, day, total_worked
            FROM days
            WHERE start_of_day >= ?1
            ORDER BY start_of_day ASC
            ",
        )?;
        let rows = stmt.query_map([timestamp], day_from_row)?;
        let mut days = Vec::new();
        for row in rows {
            days.push(row?);
        }
        Ok(days)
    }

    /// Lists all days, most recent first.
    pub fn list_days_most_recent_first(&self) -> Result<Vec<DayAggregate>, DbError> {
        let mut stmt = self.conn()?.prepare(
            "
            SELECT id, start_of_day, year, month, day, total_worked
            FROM days
            ORDER BY start_of_day DESC
            ",
        )?;
        let rows = stmt.query_map([], day_from_row)?;
        let mut days = Vec::new();
        for row in rows {
            days.push(row?);
        }
        Ok(days)
    }

    /// Sums the totals of days whose local midnight is at or after `timestamp`.
    pub fn total_worked_since(&self, timestamp: i64) -> Result<i64, DbError> {
        let total = self.conn()?.query_row(
            "SELECT COALESCE(SUM(total_worked), 0) FROM days WHERE start_of_day >= ?1",
            [timestamp],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    /// Runs a query expected to match at most one day.
    ///
    /// Extra rows are logged and ignored; the first row wins.
    fn single_day<P: Params>(&self, sql: &str, params: P) -> Result<Option<DayAggregate>, DbError> {
        let mut stmt = self.conn()?.prepare(sql)?;
        let mut rows = stmt.query_map(params, day_from_row)?;
        let Some(first) = rows.next().transpose()? else {
            return Ok(None);
        };
        let extra = rows.count();
        if extra > 0 {
            tracing::warn!(
                day_id = first.id,
                extra,
                "expected at most one matching day; using the first"
            );
        }
        Ok(Some(first))
    }
}

/// Adds `duration` to a day's total and returns the updated row.
///
/// Takes a plain connection so it also runs inside a transaction.
pub(crate) fn increment_day_total(
    conn: &Connection,
    day_id: i64,
    duration: i64,
) -> rusqlite::Result<Option<DayAggregate>> {
    conn.query_row(
        "
        UPDATE days SET total_worked = total_worked + ?1
        WHERE id = ?2
        RETURNING id, start_of_day, year, month, day, total_worked
        ",
        params![duration, day_id],
        day_from_row,
    )
    .optional()
}
