//! Persisted records shared by the storage and session layers.

use serde::{Deserialize, Serialize};

use crate::clock::DateComponents;

/// A stored slice of worked time.
///
/// Segments are immutable once written during normal tracking; only the
/// maintenance commands rewrite or delete them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkSegment {
    pub id: i64,
    pub start: i64,
    pub stop: i64,
    /// Day aggregate this segment was counted in, if any.
    pub day_id: Option<i64>,
}

impl WorkSegment {
    pub const fn duration(&self) -> i64 {
        self.stop - self.start
    }
}

/// Running worked-time total for one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayAggregate {
    pub id: i64,
    /// Local midnight of the day; unique across aggregates.
    pub start_of_day: i64,
    pub date: DateComponents,
    /// Seconds worked on this day. Only ever grows.
    pub total_worked: i64,
}

/// Whether a work session is open, and since when.
///
/// This is the only mutable state of the tracker. It is stored outside the
/// database so a session survives a crash or forced quit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    /// Start of the open session, or `None` when idle.
    pub started_at: Option<i64>,
}

impl SessionState {
    pub const fn idle() -> Self {
        Self { started_at: None }
    }

    pub const fn active(started_at: i64) -> Self {
        Self {
            started_at: Some(started_at),
        }
    }

    pub const fn is_active(&self) -> bool {
        self.started_at.is_some()
    }

    /// Seconds since the session started, clamped at zero if the clock went
    /// backwards. `None` when idle.
    pub fn elapsed_at(&self, now: i64) -> Option<i64> {
        self.started_at.map(|start| now.saturating_sub(start).max(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_state_has_no_elapsed_time() {
        let state = SessionState::idle();
        assert!(!state.is_active());
        assert_eq!(state.elapsed_at(1_000), None);
        assert_eq!(state, SessionState::default());
    }

    #[test]
    fn active_state_reports_elapsed_seconds() {
        let state = SessionState::active(1_000);
        assert!(state.is_active());
        assert_eq!(state.elapsed_at(1_090), Some(90));
        assert_eq!(state.elapsed_at(900), Some(0));
    }

    #[test]
    fn session_state_json_shape() {
        let json = serde_json::to_string(&SessionState::active(1_700_000_000)).unwrap();
        assert_eq!(json, r#"{"started_at":1700000000}"#);
        let idle: SessionState = serde_json::from_str(r#"{"started_at":null}"#).unwrap();
        assert_eq!(idle, SessionState::idle());
    }

    #[test]
    fn segment_duration() {
        let segment = WorkSegment {
            id: 1,
            start: 100,
            stop: 160,
            day_id: None,
        };
        assert_eq!(segment.duration(), 60);
    }
}
