//! Shared utilities for CLI commands.

use std::sync::LazyLock;

use anyhow::Context;
use chrono::{DateTime, Duration, TimeZone, Utc};
use regex::Regex;

/// Pre-compiled regex for relative time parsing.
static RELATIVE_TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s+(second|minute|hour|day|week)s?\s+ago$").unwrap());

/// Pre-compiled regex for id ranges such as `3..7`.
static ID_RANGE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d+)\.\.(\d+)$").unwrap());

/// Conservative bounds for relative time parsing (~1000 years in minutes).
const MAX_RELATIVE_MINUTES: i64 = 1000 * 365 * 24 * 60;

/// Parse a time argument into epoch seconds, relative to the current time.
pub fn parse_timestamp(s: &str) -> anyhow::Result<i64> {
    parse_timestamp_at(s, Utc::now())
}

/// Parse a time argument into epoch seconds.
///
/// Supports:
/// - ISO 8601: "2026-01-15T10:30:00Z"
/// - Epoch seconds: "1768473000"
/// - Relative: "2 hours ago", "30 minutes ago", "1 day ago", "1 week ago"
pub fn parse_timestamp_at(s: &str, now: DateTime<Utc>) -> anyhow::Result<i64> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.timestamp());
    }

    if let Ok(seconds) = s.parse::<i64>() {
        return Ok(seconds);
    }

    let Some(caps) = RELATIVE_TIME_RE.captures(s) else {
        anyhow::bail!(
            "Invalid time: {s}. Use ISO 8601 (e.g., 2026-01-15T10:30:00Z), epoch seconds, or relative (e.g., '2 hours ago')"
        );
    };

    let n: i64 = caps[1]
        .parse()
        .context("failed to parse number in relative time")?;

    let (max_for_unit, seconds_per_unit) = match &caps[2] {
        "second" => (MAX_RELATIVE_MINUTES * 60, 1),
        "minute" => (MAX_RELATIVE_MINUTES, 60),
        "hour" => (MAX_RELATIVE_MINUTES / 60, 60 * 60),
        "day" => (MAX_RELATIVE_MINUTES / (60 * 24), 60 * 60 * 24),
        "week" => (MAX_RELATIVE_MINUTES / (60 * 24 * 7), 60 * 60 * 24 * 7),
        unit => anyhow::bail!("Unknown time unit: {unit}"),
    };

    if n > max_for_unit {
        anyhow::bail!("Relative time value too large: {n} {}", &caps[2]);
    }

    Ok((now - Duration::seconds(n * seconds_per_unit)).timestamp())
}

/// Parse an inclusive id range written as `first..last`.
pub fn parse_id_range(s: &str) -> anyhow::Result<(i64, i64)> {
    let Some(caps) = ID_RANGE_RE.captures(s.trim()) else {
        anyhow::bail!("Invalid id range: {s}. Use first..last (e.g., 3..7)");
    };
    let first: i64 = caps[1].parse().context("id range start is too large")?;
    let last: i64 = caps[2].parse().context("id range end is too large")?;
    if first > last {
        anyhow::bail!("Invalid id range: {first} is greater than {last}");
    }
    Ok((first, last))
}

/// Formats seconds as `H:MM:SS`. Negative values are shown as zero.
pub fn format_duration(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{hours}:{minutes:02}:{secs:02}")
}

/// Formats a signed difference of seconds as `+H:MM:SS` or `-H:MM:SS`.
pub fn format_signed_duration(seconds: i64) -> String {
    let sign = if seconds < 0 { '-' } else { '+' };
    format!("{sign}{}", format_duration(seconds.saturating_abs()))
}

/// Formats a timestamp as local wall-clock time in `tz`.
pub fn format_timestamp<Tz: TimeZone>(tz: &Tz, timestamp: i64) -> String {
    DateTime::from_timestamp(timestamp, 0).map_or_else(
        || timestamp.to_string(),
        |utc| {
            utc.with_timezone(tz)
                .naive_local()
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
        },
    )
}
