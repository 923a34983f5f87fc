//! Segment listing and corrective maintenance.
//!
//! `edit` and `delete` change the segment log only. Day totals are left as
//! they are; `wt check` shows where the two disagree afterwards.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::TimeZone;

use wt_core::WorkSegment;
use wt_db::Database;

use super::util::{format_duration, format_timestamp};

/// Which segments `wt segments` lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentFilter {
    All,
    /// Segments starting at or after this timestamp.
    Since(i64),
    /// Segments with ids in this inclusive range.
    Ids(i64, i64),
}

pub fn format_segments<Tz: TimeZone>(tz: &Tz, segments: &[WorkSegment]) -> String {
    if segments.is_empty() {
        return "No segments.\n".to_string();
    }

    let mut output = format!(
        "{:<5}  {:<19}  {:<19}  {:>8}  {:>5}\n",
        "ID", "START", "STOP", "DURATION", "DAY"
    );
    for segment in segments {
        let day = segment
            .day_id
            .map_or_else(|| "-".to_string(), |id| id.to_string());
        output.push_str(&format!(
            "{:<5}  {:<19}  {:<19}  {:>8}  {:>5}\n",
            segment.id,
            format_timestamp(tz, segment.start),
            format_timestamp(tz, segment.stop),
            format_duration(segment.duration()),
            day
        ));
    }
    output
}

pub fn list<W: Write, Tz: TimeZone>(
    writer: &mut W,
    db: &Database,
    tz: &Tz,
    filter: SegmentFilter,
) -> Result<()> {
    let segments = match filter {
        SegmentFilter::All => db.list_segments(),
        SegmentFilter::Since(timestamp) => db.segments_starting_at_or_after(timestamp),
        SegmentFilter::Ids(first, last) => db.segments_in_id_range(first, last),
    }
    .context("failed to load segments")?;

    write!(writer, "{}", format_segments(tz, &segments))?;
    Ok(())
}

/// Rewrites segment `id`. Without `day`, the segment keeps its current day.
pub fn edit<W: Write, Tz: TimeZone>(
    writer: &mut W,
    db: &mut Database,
    tz: &Tz,
    id: i64,
    start: i64,
    stop: i64,
    day: Option<i64>,
) -> Result<()> {
    let Some(current) = db.segments_in_id_range(id, id)?.into_iter().next() else {
        anyhow::bail!("no segment with id {id}");
    };

    if let Some(day_id) = day {
        if db.day_by_id(day_id)?.is_none() {
            anyhow::bail!("no day with id {day_id}");
        }
    }
    let day_id = day.or(current.day_id);

    db.update_segment(id, start, stop, day_id)
        .with_context(|| format!("failed to update segment {id}"))?;

    writeln!(
        writer,
        "Updated segment {id}: {} -> {} ({}).",
        format_timestamp(tz, start),
        format_timestamp(tz, stop),
        format_duration(stop - start)
    )?;
    writeln!(writer, "Day totals were not changed; run `wt check` to compare.")?;
    Ok(())
}

pub fn delete<W: Write>(writer: &mut W, db: &mut Database, id: i64) -> Result<()> {
    let deleted = db
        .delete_segment(id)
        .with_context(|| format!("failed to delete segment {id}"))?;
    if !deleted {
        anyhow::bail!("no segment with id {id}");
    }

    writeln!(writer, "Deleted segment {id}.")?;
    writeln!(writer, "Day totals were not changed; run `wt check` to compare.")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Utc;
    use insta::assert_snapshot;
    use wt_core::DateComponents;

    // 2024-01-01T00:00:00Z
    const JAN_1: i64 = 1_704_067_200;

    fn seeded() -> Database {
        let mut db = Database::open_in_memory().unwrap();
        let day = db
            .create_day(
                JAN_1,
                DateComponents {
                    year: 2024,
                    month: 1,
                    day: 1,
                },
            )
            .unwrap();
        db.record_segment(JAN_1 + 9 * 3_600, JAN_1 + 10 * 3_600, Some(day.id))
            .unwrap();
        db.record_segment(JAN_1 + 13 * 3_600, JAN_1 + 13 * 3_600 + 1_500, Some(day.id))
            .unwrap();
        db.add_segment(JAN_1 + 20 * 3_600, JAN_1 + 20 * 3_600 + 60, None)
            .unwrap();
        db
    }

    fn render_list(db: &Database, filter: SegmentFilter) -> String {
        let mut output = Vec::new();
        list(&mut output, db, &Utc, filter).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn lists_all_segments() {
        let db = seeded();
        assert_snapshot!(render_list(&db, SegmentFilter::All), @r"
        ID     START                STOP                 DURATION    DAY
        1      2024-01-01 09:00:00  2024-01-01 10:00:00   1:00:00      1
        2      2024-01-01 13:00:00  2024-01-01 13:25:00   0:25:00      1
        3      2024-01-01 20:00:00  2024-01-01 20:01:00   0:01:00      -
        ");
    }

    #[test]
    fn filters_by_start_and_id_range() {
        let db = seeded();

        let since = render_list(&db, SegmentFilter::Since(JAN_1 + 13 * 3_600));
        assert_eq!(since.lines().count(), 3);
        assert!(!since.contains("09:00:00"));

        let ids = render_list(&db, SegmentFilter::Ids(1, 2));
        assert_eq!(ids.lines().count(), 3);
        assert!(!ids.contains("20:00:00"));

        assert_snapshot!(render_list(&db, SegmentFilter::Ids(10, 20)), @"No segments.");
    }

    #[test]
    fn edit_keeps_day_and_leaves_totals() {
        let mut db = seeded();
        let mut output = Vec::new();
        edit(&mut output, &mut db, &Utc, 1, JAN_1 + 9 * 3_600, JAN_1 + 9 * 3_600 + 600, None).unwrap();

        assert_snapshot!(String::from_utf8(output).unwrap(), @r"
        Updated segment 1: 2024-01-01 09:00:00 -> 2024-01-01 09:10:00 (0:10:00).
        Day totals were not changed; run `wt check` to compare.
        ");

        let segment = db.segments_in_id_range(1, 1).unwrap()[0];
        assert_eq!(segment.day_id, Some(1));
        assert_eq!(segment.duration(), 600);
        assert_eq!(db.day_by_id(1).unwrap().unwrap().total_worked, 5_100);
    }

    #[test]
    fn edit_rejects_unknown_ids_and_bad_ranges() {
        let mut db = seeded();
        let mut output = Vec::new();

        let err = edit(&mut output, &mut db, &Utc, 99, 0, 10, None).unwrap_err();
        assert_eq!(err.to_string(), "no segment with id 99");

        let err = edit(&mut output, &mut db, &Utc, 1, 0, 10, Some(42)).unwrap_err();
        assert_eq!(err.to_string(), "no day with id 42");

        assert!(edit(&mut output, &mut db, &Utc, 1, 10, 10, None).is_err());
        assert!(output.is_empty());
    }

    #[test]
    fn delete_removes_segment() {
        let mut db = seeded();
        let mut output = Vec::new();
        delete(&mut output, &mut db, 3).unwrap();

        assert_snapshot!(String::from_utf8(output).unwrap(), @r"
        Deleted segment 3.
        Day totals were not changed; run `wt check` to compare.
        ");
        assert_eq!(db.list_segments().unwrap().len(), 2);

        let mut output = Vec::new();
        assert!(delete(&mut output, &mut db, 3).is_err());
    }
}
