//! Check command: compares day totals with the segment log.

use std::io::Write;

use anyhow::{Context, Result};

use wt_db::Database;
use wt_tracker::{ConsistencyReport, check_consistency};

use super::util::{format_duration, format_signed_duration};

pub fn format_report(report: &ConsistencyReport) -> String {
    let noun = if report.days_checked == 1 { "day" } else { "days" };
    let mut output = format!("Checked {} {noun}.\n", report.days_checked);

    for mismatch in &report.mismatches {
        output.push_str(&format!(
            "{} (day {}): stored {}, segments {} ({})\n",
            mismatch.day.date,
            mismatch.day.id,
            format_duration(mismatch.day.total_worked),
            format_duration(mismatch.segment_total),
            format_signed_duration(mismatch.difference())
        ));
    }

    if !report.unattributed.is_empty() {
        let ids: Vec<String> = report
            .unattributed
            .iter()
            .map(|segment| segment.id.to_string())
            .collect();
        output.push_str(&format!("Segments without a day: {}\n", ids.join(", ")));
    }

    if report.is_consistent() {
        output.push_str("Day totals match the recorded segments.\n");
    }
    output
}

/// Prints the consistency report and returns it so the caller can set the exit status.
pub fn run<W: Write>(writer: &mut W, db: &Database) -> Result<ConsistencyReport> {
    let report = check_consistency(db).context("failed to check day totals")?;
    write!(writer, "{}", format_report(&report))?;
    Ok(report)
}
