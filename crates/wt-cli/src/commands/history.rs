//! History command: worked time per day, grouped by month.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;

use wt_core::DayAggregate;
use wt_db::Database;

use super::util::format_duration;

/// Days of one calendar month, most recent first.
#[derive(Debug, Serialize)]
pub struct MonthHistory {
    pub year: i32,
    pub month: u32,
    pub total_worked: i64,
    pub days: Vec<DayAggregate>,
}

impl MonthHistory {
    fn title(&self) -> String {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).map_or_else(
            || format!("{}-{:02}", self.year, self.month),
            |first| first.format("%B %Y").to_string(),
        )
    }
}

/// Groups consecutive days of the same month, keeping their order.
pub fn group_by_month(days: Vec<DayAggregate>) -> Vec<MonthHistory> {
    let mut months: Vec<MonthHistory> = Vec::new();
    for day in days {
        match months.last_mut() {
            Some(month) if month.year == day.date.year && month.month == day.date.month => {
                month.total_worked += day.total_worked;
                month.days.push(day);
            }
            _ => months.push(MonthHistory {
                year: day.date.year,
                month: day.date.month,
                total_worked: day.total_worked,
                days: vec![day],
            }),
        }
    }
    months
}

pub fn format_history(months: &[MonthHistory]) -> String {
    if months.is_empty() {
        return "No work recorded.\n".to_string();
    }

    let blocks: Vec<String> = months
        .iter()
        .map(|month| {
            let mut block = format!("{} ({})\n", month.title(), format_duration(month.total_worked));
            for day in &month.days {
                block.push_str(&format!("  {}  {}\n", day.date, format_duration(day.total_worked)));
            }
            block
        })
        .collect();
    blocks.join("\n")
}

pub fn run<W: Write>(writer: &mut W, db: &Database, json: bool) -> Result<()> {
    let days = db
        .list_days_most_recent_first()
        .context("failed to load day totals")?;
    let months = group_by_month(days);

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&months)?)?;
    } else {
        write!(writer, "{}", format_history(&months))?;
    }
    Ok(())
}
