pub mod attendance;
pub mod create;
pub mod export;
pub mod fields;
pub mod init;
pub mod list;
pub mod show;
pub mod time;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use chrono::{DateTime, Duration, Utc};
use comfy_table::{Cell, Table};

use quizlens_core::attendance::JsonLinesAttendanceLog;
use quizlens_core::config::{load_config_from, ReportingConfig};
use quizlens_core::engine::ReportingEngine;
use quizlens_core::model::{parse_timestamp, DateRange, ReportFilters};
use quizlens_core::report::SummaryStats;
use quizlens_core::source::JsonFileSource;
use quizlens_core::store::JsonFileReportStore;

use crate::FilterArgs;

/// Global options shared by every command.
pub struct Context {
    pub config_path: Option<PathBuf>,
    pub records: PathBuf,
}

impl Context {
    pub fn config(&self) -> Result<ReportingConfig> {
        load_config_from(self.config_path.as_deref())
    }

    /// An engine over the records file, the on-disk definition store and the
    /// attendance log.
    pub fn engine(&self) -> Result<Arc<ReportingEngine>> {
        let config = self.config()?;
        tracing::debug!(records = %self.records.display(), "opening engine");
        let store = JsonFileReportStore::new(config.store_dir.clone());
        let log = JsonLinesAttendanceLog::new(config.attendance_log.clone());
        let engine = ReportingEngine::new(
            Arc::new(JsonFileSource::new(self.records.clone())),
            Arc::new(store),
            config,
        )
        .with_attendance_log(Arc::new(log));
        Ok(Arc::new(engine))
    }
}

/// Parse a date bound. A bare `YYYY-MM-DD` end bound covers the whole day.
pub fn parse_bound(value: &str, end_of_day: bool) -> Result<DateTime<Utc>> {
    let ts = parse_timestamp(value)
        .with_context(|| format!("invalid date '{value}' (expected YYYY-MM-DD or RFC 3339)"))?;
    if end_of_day && value.trim().len() == 10 {
        Ok(ts + Duration::days(1) - Duration::seconds(1))
    } else {
        Ok(ts)
    }
}

/// Build a date range from optional bounds. A missing start falls back to
/// `window_days` before the end; a missing end falls back to now.
pub fn parse_range(
    from: Option<&str>,
    to: Option<&str>,
    window_days: i64,
) -> Result<Option<DateRange>> {
    if from.is_none() && to.is_none() {
        return Ok(None);
    }
    let end = match to {
        Some(t) => parse_bound(t, true)?,
        None => Utc::now(),
    };
    let start = match from {
        Some(f) => parse_bound(f, false)?,
        None => end - Duration::days(window_days),
    };
    Ok(Some(DateRange::new(start, end)?))
}

pub fn report_filters(args: &FilterArgs) -> ReportFilters {
    ReportFilters {
        students: args.students.clone(),
        classes: args.classes.clone(),
        subjects: args.subjects.clone(),
        quiz_types: args.quiz_types.clone(),
        difficulty_levels: args.difficulty.clone(),
    }
}

pub fn summary_table(summary: &SummaryStats) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        "Records",
        "Avg Score",
        "Highest",
        "Lowest",
        "Avg Time",
        "Completion",
    ]);
    table.add_row(vec![
        Cell::new(summary.total_records),
        Cell::new(format!("{:.1}", summary.average_score)),
        Cell::new(format!("{:.1}", summary.highest_score)),
        Cell::new(format!("{:.1}", summary.lowest_score)),
        Cell::new(format!("{}s", summary.average_time)),
        Cell::new(format!("{:.1}%", summary.completion_rate)),
    ]);
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_only_end_bound_covers_the_day() {
        let end = parse_bound("2025-03-31", true).unwrap();
        assert_eq!(end.to_rfc3339(), "2025-03-31T23:59:59+00:00");
        let start = parse_bound("2025-03-01", false).unwrap();
        assert_eq!(start.to_rfc3339(), "2025-03-01T00:00:00+00:00");
    }

    #[test]
    fn range_requires_order() {
        assert!(parse_range(Some("2025-03-10"), Some("2025-03-01"), 30).is_err());
        assert!(parse_range(None, None, 30).unwrap().is_none());
        let r = parse_range(None, Some("2025-03-31"), 7).unwrap().unwrap();
        assert_eq!(r.start.to_rfc3339(), "2025-03-24T23:59:59+00:00");
    }

    #[test]
    fn garbage_dates_are_rejected() {
        assert!(parse_bound("next tuesday", false).is_err());
    }
}
