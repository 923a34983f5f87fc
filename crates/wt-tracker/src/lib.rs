//! Work session tracking.
//!
//! [`SessionManager`] owns the database and the persisted session state and
//! implements the start/stop state machine plus the duration queries built on
//! top of them.

mod consistency;
mod manager;
mod state;

use std::path::PathBuf;

use thiserror::Error;

use wt_core::ClockError;
use wt_db::DbError;

pub use consistency::{ConsistencyReport, DayMismatch, check_consistency};
pub use manager::{
    RecordedSegmentSummary, SessionManager, StartOutcome, StopOutcome, StopReport,
};
pub use state::{StateFile, StateLock};

/// Tracker errors.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    Clock(#[from] ClockError),
    /// The session state file could not be read or written.
    #[error("failed to access session state at {}", path.display())]
    StateIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The session state file does not hold valid JSON.
    #[error("invalid session state in {}", path.display())]
    StateJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
