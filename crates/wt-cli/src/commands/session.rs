//! Start and stop commands.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::TimeZone;

use wt_tracker::{SessionManager, StartOutcome, StopOutcome};

use super::util::{format_duration, format_timestamp};

pub fn start<W: Write, Tz: TimeZone>(
    writer: &mut W,
    manager: &mut SessionManager<Tz>,
    at: i64,
) -> Result<()> {
    let outcome = manager
        .start_working_at(at)
        .context("failed to start working")?;
    let tz = manager.timezone();
    match outcome {
        StartOutcome::Started { started_at } => {
            writeln!(writer, "Started working at {}.", format_timestamp(tz, started_at))?;
        }
        StartOutcome::AlreadyActive { started_at } => {
            writeln!(
                writer,
                "Already working since {}.",
                format_timestamp(tz, started_at)
            )?;
        }
    }
    Ok(())
}

pub fn stop<W: Write, Tz: TimeZone>(
    writer: &mut W,
    manager: &mut SessionManager<Tz>,
    at: i64,
) -> Result<()> {
    let outcome = manager.stop_working_at(at).context("failed to stop working")?;
    let tz = manager.timezone();

    let report = match outcome {
        StopOutcome::Stopped(report) => report,
        StopOutcome::NotActive => {
            writeln!(writer, "Not working.")?;
            return Ok(());
        }
    };

    if report.segments.is_empty() {
        writeln!(writer, "Stopped working. Nothing to record.")?;
        return Ok(());
    }

    let noun = if report.segments.len() == 1 {
        "segment"
    } else {
        "segments"
    };
    writeln!(
        writer,
        "Stopped working. Recorded {} in {} {noun}:",
        format_duration(report.recorded_duration()),
        report.segments.len()
    )?;
    for segment in &report.segments {
        writeln!(
            writer,
            "  #{}  {} -> {}  {}",
            segment.segment_id,
            format_timestamp(tz, segment.start),
            format_timestamp(tz, segment.stop),
            format_duration(segment.stop - segment.start)
        )?;
    }
    Ok(())
}
