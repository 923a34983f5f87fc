//! The start/stop state machine and duration queries.
//!
//! # States
//!
//! - **Idle**: no session is open.
//! - **Active(start)**: a session has been open since `start`.
//!
//! Starting while active and stopping while idle are no-ops that log a warning.
//! Every transition locks the state file, reloads it, and saves the new state
//! before adopting it, so the persisted state always matches what was acted on.
//!
//! # Stopping
//!
//! The session is split at each local midnight it crosses. Every non-empty
//! slice is added to its day's total and appended to the segment log in one
//! transaction. Slices are not transactional with each other: if one fails,
//! earlier slices stay recorded, the session is closed, and the error is
//! returned.
//!
//! # Restarts
//!
//! A session left open when the process exits is reloaded on the next start
//! and keeps accruing time.

use chrono::{Local, TimeZone, Utc};
use serde::Serialize;

use wt_core::{DayAggregate, DaySpan, SessionState, Window, clock, split_into_day_spans};
use wt_db::{Database, RecordedSegment};

use crate::{ConsistencyReport, StateFile, TrackerError, check_consistency};

/// Result of a start request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// A new session was opened.
    Started { started_at: i64 },
    /// A session was already open; nothing changed.
    AlreadyActive { started_at: i64 },
}

/// Result of a stop request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopOutcome {
    /// The open session was closed and recorded.
    Stopped(StopReport),
    /// No session was open; nothing changed.
    NotActive,
}

/// What a stop wrote to the stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StopReport {
    pub started_at: i64,
    pub stopped_at: i64,
    /// One entry per recorded day slice, in chronological order.
    pub segments: Vec<RecordedSegmentSummary>,
}

/// A recorded slice as reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RecordedSegmentSummary {
    pub segment_id: i64,
    pub start: i64,
    pub stop: i64,
    pub day_id: Option<i64>,
}

impl StopReport {
    /// Seconds recorded across all slices.
    pub fn recorded_duration(&self) -> i64 {
        self.segments
            .iter()
            .map(|segment| segment.stop - segment.start)
            .sum()
    }
}

impl From<RecordedSegment> for RecordedSegmentSummary {
    fn from(recorded: RecordedSegment) -> Self {
        Self {
            segment_id: recorded.segment.id,
            start: recorded.segment.start,
            stop: recorded.segment.stop,
            day_id: recorded.segment.day_id,
        }
    }
}

/// Tracks work sessions against a database and a persisted state file.
///
/// Methods ending in `_at` take the current time explicitly; the others read
/// the system clock.
pub struct SessionManager<Tz: TimeZone = Local> {
    db: Database,
    state_file: StateFile,
    state: SessionState,
    tz: Tz,
}

impl SessionManager<Local> {
    /// Creates a manager using the local calendar.
    pub fn new(db: Database, state_file: StateFile) -> Result<Self, TrackerError> {
        Self::with_timezone(db, state_file, Local)
    }
}

impl<Tz: TimeZone> SessionManager<Tz> {
    /// Creates a manager whose days follow `tz`, reloading any open session.
    pub fn with_timezone(
        db: Database,
        state_file: StateFile,
        tz: Tz,
    ) -> Result<Self, TrackerError> {
        let state = state_file.load()?;
        let manager = Self {
            db,
            state_file,
            state,
            tz,
        };
        manager.note_restored_session(now());
        Ok(manager)
    }

    pub const fn database(&self) -> &Database {
        &self.db
    }

    pub fn into_database(self) -> Database {
        self.db
    }

    pub const fn timezone(&self) -> &Tz {
        &self.tz
    }

    pub const fn is_session_active(&self) -> bool {
        self.state.is_active()
    }

    /// Start of the open session, if any.
    pub const fn session_started_at(&self) -> Option<i64> {
        self.state.started_at
    }

    pub fn start_working(&mut self) -> Result<StartOutcome, TrackerError> {
        self.start_working_at(now())
    }

    /// Opens a session at `now` unless one is already open.
    ///
    /// A `now` outside the calendar range is rejected before anything is saved.
    pub fn start_working_at(&mut self, now: i64) -> Result<StartOutcome, TrackerError> {
        clock::start_of_day(&self.tz, now)?;
        let _lock = self.state_file.lock()?;
        self.state = self.state_file.load()?;

        if let Some(started_at) = self.state.started_at {
            tracing::warn!(started_at, "work has already started");
            return Ok(StartOutcome::AlreadyActive { started_at });
        }

        let next = SessionState::active(now);
        self.state_file.save(&next)?;
        self.state = next;
        tracing::info!(started_at = now, "started working");
        Ok(StartOutcome::Started { started_at: now })
    }

    pub fn stop_working(&mut self) -> Result<StopOutcome, TrackerError> {
        self.stop_working_at(now())
    }

    /// Closes the open session at `now` and records it, split by day.
    ///
    /// A `now` outside the calendar range is rejected and the session stays
    /// open. A persisted start that cannot be split closes the session.
    pub fn stop_working_at(&mut self, now: i64) -> Result<StopOutcome, TrackerError> {
        clock::start_of_day(&self.tz, now)?;
        let _lock = self.state_file.lock()?;
        self.state = self.state_file.load()?;

        let Some(started_at) = self.state.started_at else {
            tracing::warn!("work has not started yet");
            return Ok(StopOutcome::NotActive);
        };

        let spans = match split_into_day_spans(&self.tz, started_at, now) {
            Ok(spans) => spans,
            Err(error) => {
                tracing::error!(started_at, %error, "cannot split work session; closing it");
                return Err(self.close_after_failure(error.into()));
            }
        };
        if now < started_at {
            tracing::warn!(started_at, stopped_at = now, "clock moved backwards; nothing to record");
        }

        let mut segments = Vec::with_capacity(spans.len());
        for span in &spans {
            match self.record_span(span) {
                Ok(recorded) => segments.push(recorded.into()),
                Err(error) => {
                    tracing::error!(
                        %error,
                        recorded = segments.len(),
                        abandoned = spans.len() - segments.len(),
                        "failed to record work segment; closing the session"
                    );
                    return Err(self.close_after_failure(error));
                }
            }
        }

        self.clear_state()?;
        let report = StopReport {
            started_at,
            stopped_at: now,
            segments,
        };
        tracing::info!(
            started_at,
            stopped_at = now,
            segments = report.segments.len(),
            recorded = report.recorded_duration(),
            "stopped working"
        );
        Ok(StopOutcome::Stopped(report))
    }

    /// Id of the day aggregate containing `timestamp`, created if missing.
    ///
    /// Store failures are logged and yield `None`.
    pub fn resolve_day_id(&mut self, timestamp: i64) -> Option<i64> {
        match self.find_or_create_day(timestamp) {
            Ok(day) => Some(day.id),
            Err(error) => {
                tracing::error!(timestamp, %error, "failed to resolve day");
                None
            }
        }
    }

    pub fn current_session_duration(&self) -> Option<i64> {
        self.current_session_duration_at(now())
    }

    /// Seconds the open session has been running, or `None` when idle.
    pub fn current_session_duration_at(&self, now: i64) -> Option<i64> {
        self.state.elapsed_at(now)
    }

    pub fn today_duration(&self) -> Result<i64, TrackerError> {
        self.windowed_duration_at(Window::Today, now())
    }

    pub fn windowed_duration(&self, window: Window) -> Result<i64, TrackerError> {
        self.windowed_duration_at(window, now())
    }

    /// Seconds worked within `window`, including the open session.
    ///
    /// A session that began before the window covers all of it, so the
    /// result is the window's elapsed length and the stores are not read.
    pub fn windowed_duration_at(&self, window: Window, now: i64) -> Result<i64, TrackerError> {
        let window_start = clock::window_start(&self.tz, now, window)?;
        match self.state.started_at {
            Some(started_at) if started_at < window_start => Ok(now - window_start),
            Some(_) => {
                let open = self.current_session_duration_at(now).unwrap_or(0);
                Ok(open + self.db.total_worked_since(window_start)?)
            }
            None => Ok(self.db.total_worked_since(window_start)?),
        }
    }

    /// All day aggregates, most recent first.
    pub fn days_most_recent_first(&self) -> Result<Vec<DayAggregate>, TrackerError> {
        Ok(self.db.list_days_most_recent_first()?)
    }

    /// Compares day totals with the segment log.
    pub fn check_consistency(&self) -> Result<ConsistencyReport, TrackerError> {
        Ok(check_consistency(&self.db)?)
    }

    fn record_span(&mut self, span: &DaySpan) -> Result<RecordedSegment, TrackerError> {
        let day_id = self.resolve_day_id(span.start);
        if day_id.is_none() {
            tracing::error!(
                start = span.start,
                stop = span.stop,
                "no day for work segment; it will be missing from day totals"
            );
        }
        Ok(self.db.record_segment(span.start, span.stop, day_id)?)
    }

    fn find_or_create_day(&mut self, timestamp: i64) -> Result<DayAggregate, TrackerError> {
        let start_of_day = clock::start_of_day(&self.tz, timestamp)?;
        if let Some(day) = self.db.day_by_start_of_day(start_of_day)? {
            return Ok(day);
        }
        let date = clock::date_components(&self.tz, timestamp)?;
        let day = self.db.create_day(start_of_day, date)?;
        tracing::debug!(day_id = day.id, %date, "created day");
        Ok(day)
    }

    fn clear_state(&mut self) -> Result<(), TrackerError> {
        let idle = SessionState::idle();
        self.state_file.save(&idle)?;
        self.state = idle;
        Ok(())
    }

    /// Clears the session after `error` aborted a stop and hands `error` back.
    ///
    /// A failure to clear is logged; `error` is still the one returned.
    fn close_after_failure(&mut self, error: TrackerError) -> TrackerError {
        if let Err(clear_error) = self.clear_state() {
            tracing::error!(
                error = %clear_error,
                "failed to clear session state after an aborted stop"
            );
            self.state = SessionState::idle();
        }
        error
    }

    fn note_restored_session(&self, now: i64) {
        let Some(started_at) = self.state.started_at else {
            return;
        };
        match clock::start_of_day(&self.tz, now) {
            Ok(today) if started_at < today => tracing::warn!(
                started_at,
                "restored a session that began before today; it is still counting"
            ),
            _ => tracing::debug!(started_at, "restored open session"),
        }
    }
}

fn now() -> i64 {
    Utc::now().timestamp()
}
