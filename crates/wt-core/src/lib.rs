//! Core domain logic for the work time tracker.
//!
//! This crate contains the pure parts of the tracker:
//! - Clock: calendar-aware day boundaries and trailing windows
//! - Segmentation: splitting a session at local midnights
//! - Records: work segments, day aggregates, and the session state

pub mod clock;
pub mod segment;
pub mod types;

pub use clock::{ClockError, DateComponents, Window};
pub use segment::{DaySpan, split_into_day_spans};
pub use types::{DayAggregate, SessionState, WorkSegment};
