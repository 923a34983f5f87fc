//! Storage layer for the work time tracker.
//!
//! Provides persistence for work segments and per-day totals using `rusqlite`.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! A `Database` can be moved between threads but not shared without external
//! synchronization. Hosts that query from several threads should wrap it in a
//! `Mutex<Database>`; every write is a single statement or transaction, so
//! serializing calls is enough to keep the totals consistent.
//!
//! # Schema
//!
//! Timestamps are INTEGER epoch seconds.
//!
//! - `days`: one row per local calendar day (`start_of_day` is unique), holding
//!   the display date and the running `total_worked` in seconds.
//! - `segments`: the append-only log of worked slices. `day_id` references the
//!   day the slice was counted in and is set to NULL if that day is deleted.
//!
//! # Availability
//!
//! [`Database::open_or_unavailable`] never fails: if the file cannot be opened
//! it logs the failure and returns a handle whose every operation reports
//! [`DbError::Unavailable`].

mod days;
mod segments;

use std::path::Path;

use rusqlite::{Connection, Row};
use thiserror::Error;

use wt_core::{DateComponents, DayAggregate, WorkSegment};

pub use segments::RecordedSegment;

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// The database could not be opened at startup.
    #[error("database is unavailable")]
    Unavailable,
    /// A segment must stop after it starts.
    #[error("invalid segment: stop {stop} is not after start {start}")]
    InvalidSegment { start: i64, stop: i64 },
    /// Day totals only ever grow.
    #[error("cannot add negative duration {0} to a day total")]
    NegativeDuration(i64),
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Option<Connection>,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn: Some(conn) };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn: Some(conn) };
        db.init()?;
        Ok(db)
    }

    /// Opens a database, degrading to an unavailable handle on failure.
    pub fn open_or_unavailable(path: &Path) -> Self {
        match Self::open(path) {
            Ok(db) => db,
            Err(error) => {
                tracing::error!(
                    path = %path.display(),
                    %error,
                    "failed to open database; persistence is unavailable"
                );
                Self::unavailable()
            }
        }
    }

    /// A handle that fails every operation with [`DbError::Unavailable`].
    pub const fn unavailable() -> Self {
        Self { conn: None }
    }

    pub const fn is_available(&self) -> bool {
        self.conn.is_some()
    }

    fn conn(&self) -> Result<&Connection, DbError> {
        self.conn.as_ref().ok_or(DbError::Unavailable)
    }

    fn conn_mut(&mut self) -> Result<&mut Connection, DbError> {
        self.conn.as_mut().ok_or(DbError::Unavailable)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        let conn = self.conn()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(
            "
            -- One row per local calendar day
            -- start_of_day: epoch seconds of local midnight
            -- total_worked: seconds, only ever incremented
            CREATE TABLE IF NOT EXISTS days (
                id INTEGER PRIMARY KEY,
                start_of_day INTEGER NOT NULL,
                year INTEGER NOT NULL,
                month INTEGER NOT NULL,
                day INTEGER NOT NULL,
                total_worked INTEGER NOT NULL DEFAULT 0
            );

            CREATE UNIQUE INDEX IF NOT EXISTS idx_days_start_of_day ON days(start_of_day);
            CREATE INDEX IF NOT EXISTS idx_days_date ON days(year, month, day);

            -- Append-only log of worked slices, each within one day
            CREATE TABLE IF NOT EXISTS segments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                start INTEGER NOT NULL,
                stop INTEGER NOT NULL,
                day_id INTEGER,
                CHECK (stop > start),
                FOREIGN KEY (day_id) REFERENCES days(id) ON DELETE SET NULL
            );

            CREATE INDEX IF NOT EXISTS idx_segments_start ON segments(start);
            CREATE INDEX IF NOT EXISTS idx_segments_day ON segments(day_id);
            ",
        )?;
        Ok(())
    }
}

fn segment_from_row(row: &Row<'_>) -> rusqlite::Result<WorkSegment> {
    Ok(WorkSegment {
        id: row.get(0)?,
        start: row.get(1)?,
        stop: row.get(2)?,
        day_id: row.get(3)?,
    })
}

fn day_from_row(row: &Row<'_>) -> rusqlite::Result<DayAggregate> {
    Ok(DayAggregate {
        id: row.get(0)?,
        start_of_day: row.get(1)?,
        date: DateComponents {
            year: row.get(2)?,
            month: row.get(3)?,
            day: row.get(4)?,
        },
        total_worked: row.get(5)?,
    })
}
