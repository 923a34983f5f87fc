//! Status command: the open session and worked totals.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::TimeZone;
use serde::Serialize;

use wt_core::Window;
use wt_tracker::SessionManager;

use super::util::{format_duration, format_timestamp};

/// Snapshot of the tracker as shown by `wt status`.
#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub active: bool,
    pub started_at: Option<i64>,
    /// Seconds in the open session.
    pub current_session: Option<i64>,
    pub today: i64,
    pub week: i64,
    pub month: i64,
    /// `week` spread over its seven days.
    pub week_daily_average: i64,
    /// `month` spread over its thirty days.
    pub month_daily_average: i64,
    pub timezone: String,
}

pub fn build_report<Tz: TimeZone>(
    manager: &SessionManager<Tz>,
    now: i64,
    timezone: &str,
) -> Result<StatusReport> {
    let windowed = |window: Window| {
        manager
            .windowed_duration_at(window, now)
            .with_context(|| format!("failed to compute time worked in {window}"))
    };

    let week = windowed(Window::WEEK)?;
    let month = windowed(Window::MONTH)?;
    Ok(StatusReport {
        active: manager.is_session_active(),
        started_at: manager.session_started_at(),
        current_session: manager.current_session_duration_at(now),
        today: windowed(Window::Today)?,
        week,
        month,
        week_daily_average: daily_average(week, Window::WEEK),
        month_daily_average: daily_average(month, Window::MONTH),
        timezone: timezone.to_string(),
    })
}

fn daily_average(total: i64, window: Window) -> i64 {
    total / i64::from(window.days())
}

/// Renders the report; with `average`, the 7- and 30-day lines show per-day averages.
pub fn format_status<Tz: TimeZone>(tz: &Tz, report: &StatusReport, average: bool) -> String {
    let mut output = String::new();

    match (report.started_at, report.current_session) {
        (Some(started_at), Some(elapsed)) => {
            output.push_str(&format!(
                "Working since {} ({})\n",
                format_timestamp(tz, started_at),
                format_duration(elapsed)
            ));
        }
        _ => output.push_str("Not working.\n"),
    }

    output.push_str(&format!("{:<9}{}\n", "Today:", format_duration(report.today)));
    let trailing = if average {
        [
            ("7 days:", report.week_daily_average, "/day"),
            ("30 days:", report.month_daily_average, "/day"),
        ]
    } else {
        [("7 days:", report.week, ""), ("30 days:", report.month, "")]
    };
    for (label, seconds, suffix) in trailing {
        output.push_str(&format!("{label:<9}{}{suffix}\n", format_duration(seconds)));
    }
    output.push_str(&format!("Time zone: {}\n", report.timezone));

    output
}

pub fn run<W: Write, Tz: TimeZone>(
    writer: &mut W,
    manager: &SessionManager<Tz>,
    now: i64,
    timezone: &str,
    json: bool,
    average: bool,
) -> Result<()> {
    let report = build_report(manager, now, timezone)?;
    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&report)?)?;
    } else {
        write!(writer, "{}", format_status(manager.timezone(), &report, average))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Utc;
    use insta::assert_snapshot;
    use tempfile::TempDir;
    use wt_db::Database;
    use wt_tracker::StateFile;

    // 2024-05-11T10:00:00Z
    const MAY_11_10AM: i64 = 1_715_421_600;

    fn manager(temp: &TempDir) -> SessionManager<Utc> {
        SessionManager::with_timezone(
            Database::open_in_memory().unwrap(),
            StateFile::new(temp.path().join("session.json")),
            Utc,
        )
        .unwrap()
    }

    fn render(manager: &SessionManager<Utc>, now: i64, json: bool) -> String {
        render_with(manager, now, json, false)
    }

    fn render_with(manager: &SessionManager<Utc>, now: i64, json: bool, average: bool) -> String {
        let mut output = Vec::new();
        run(&mut output, manager, now, "UTC", json, average).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn status_while_working() {
        let temp = TempDir::new().unwrap();
        let mut manager = manager(&temp);

        // One hour three days ago, then an open session since 10:00.
        let three_days_ago = MAY_11_10AM - 3 * 86_400;
        manager.start_working_at(three_days_ago).unwrap();
        manager.stop_working_at(three_days_ago + 3_600).unwrap();
        manager.start_working_at(MAY_11_10AM).unwrap();

        let output = render(&manager, MAY_11_10AM + 1_800, false);
        assert_snapshot!(output, @r"
        Working since 2024-05-11 10:00:00 (0:30:00)
        Today:   0:30:00
        7 days:  1:30:00
        30 days: 1:30:00
        Time zone: UTC
        ");
    }

    #[test]
    fn status_with_daily_averages() {
        let temp = TempDir::new().unwrap();
        let mut manager = manager(&temp);

        // Seven hours two days ago, three hours twenty days ago.
        let two_days_ago = MAY_11_10AM - 2 * 86_400;
        let twenty_days_ago = MAY_11_10AM - 20 * 86_400;
        manager.start_working_at(twenty_days_ago).unwrap();
        manager.stop_working_at(twenty_days_ago + 3 * 3_600).unwrap();
        manager.start_working_at(two_days_ago).unwrap();
        manager.stop_working_at(two_days_ago + 7 * 3_600).unwrap();

        let output = render_with(&manager, MAY_11_10AM, false, true);
        assert_snapshot!(output, @r"
        Not working.
        Today:   0:00:00
        7 days:  1:00:00/day
        30 days: 0:20:00/day
        Time zone: UTC
        ");
    }

    #[test]
    fn status_when_idle() {
        let temp = TempDir::new().unwrap();
        let manager = manager(&temp);

        let output = render(&manager, MAY_11_10AM, false);
        assert_snapshot!(output, @r"
        Not working.
        Today:   0:00:00
        7 days:  0:00:00
        30 days: 0:00:00
        Time zone: UTC
        ");
    }

    #[test]
    fn status_json() {
        let temp = TempDir::new().unwrap();
        let mut manager = manager(&temp);
        manager.start_working_at(MAY_11_10AM).unwrap();

        let output = render(&manager, MAY_11_10AM + 60, true);
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["active"], true);
        assert_eq!(value["started_at"], MAY_11_10AM);
        assert_eq!(value["current_session"], 60);
        assert_eq!(value["today"], 60);
        assert_eq!(value["week"], 60);
        assert_eq!(value["month"], 60);
        assert_eq!(value["week_daily_average"], 8);
        assert_eq!(value["month_daily_average"], 2);
        assert_eq!(value["timezone"], "UTC");
    }

    #[test]
    fn status_without_storage_fails() {
        let temp = TempDir::new().unwrap();
        let manager = SessionManager::with_timezone(
            Database::unavailable(),
            StateFile::new(temp.path().join("session.json")),
            Utc,
        )
        .unwrap();

        let mut output = Vec::new();
        let err = run(&mut output, &manager, MAY_11_10AM, "UTC", false, false).unwrap_err();
        assert!(err.to_string().contains("today"));
    }
}
