//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Work time tracker.
///
/// Records work sessions between `start` and `stop`, splits them at midnight,
/// and reports totals for today and the trailing week and month.
#[derive(Debug, Parser)]
#[command(name = "wt", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start a work session.
    Start {
        /// When the session started (ISO 8601, epoch seconds, or '10 minutes ago').
        #[arg(long)]
        at: Option<String>,
    },

    /// Stop the open work session and record it.
    Stop {
        /// When the session stopped (ISO 8601, epoch seconds, or '10 minutes ago').
        #[arg(long)]
        at: Option<String>,
    },

    /// Show the current session and worked totals.
    Status {
        /// Output as JSON.
        #[arg(long)]
        json: bool,

        /// Show 7- and 30-day totals as daily averages.
        #[arg(long)]
        average: bool,
    },

    /// List worked time per day, most recent first.
    History {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List recorded work segments.
    Segments {
        /// Only segments starting at or after this time.
        #[arg(long, conflicts_with = "ids")]
        since: Option<String>,

        /// Only segments whose id is in this inclusive range (e.g. 3..7).
        #[arg(long)]
        ids: Option<String>,
    },

    /// Rewrite a recorded segment. Day totals are not adjusted.
    Edit {
        /// Segment id.
        id: i64,

        /// New start time.
        #[arg(long)]
        start: String,

        /// New stop time.
        #[arg(long)]
        stop: String,

        /// Day id to attribute the segment to (defaults to its current day).
        #[arg(long)]
        day: Option<i64>,
    },

    /// Delete a recorded segment. Day totals are not adjusted.
    Delete {
        /// Segment id.
        id: i64,
    },

    /// Compare day totals with the recorded segments.
    Check,
}
