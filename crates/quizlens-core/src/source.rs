//! Record sources.
//!
//! The engine only depends on the [`DataSource`] trait. Production systems
//! back it with a real query over attempt/attendance/time-log storage; this
//! module ships an in-memory fixture source and a JSON file source.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};

use anyhow::Context;
use async_trait::async_trait;

use crate::filter;
use crate::model::{DateRange, Record, ReportFilters};

/// Supplies raw event records for a report.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Human-readable source name (e.g. "fixture").
    fn name(&self) -> &str;

    /// Records matching every filter category whose `date` is inside `range`.
    async fn fetch_records(
        &self,
        filters: &ReportFilters,
        range: &DateRange,
    ) -> anyhow::Result<Vec<Record>>;
}

/// An in-memory source over a fixed record set.
pub struct FixtureSource {
    records: Vec<Record>,
    call_count: AtomicU32,
}

impl FixtureSource {
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records,
            call_count: AtomicU32::new(0),
        }
    }

    /// Number of fetches served.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl DataSource for FixtureSource {
    fn name(&self) -> &str {
        "fixture"
    }

    async fn fetch_records(
        &self,
        filters: &ReportFilters,
        range: &DateRange,
    ) -> anyhow::Result<Vec<Record>> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        Ok(filter::apply(&self.records, filters, range))
    }
}

/// Reads a JSON array of records from disk on every fetch, so exports
/// always reflect the file's current contents.
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DataSource for JsonFileSource {
    fn name(&self) -> &str {
        "json-file"
    }

    async fn fetch_records(
        &self,
        filters: &ReportFilters,
        range: &DateRange,
    ) -> anyhow::Result<Vec<Record>> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("failed to read records from {}", self.path.display()))?;
        let records: Vec<Record> = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse records in {}", self.path.display()))?;
        tracing::debug!(
            path = %self.path.display(),
            total = records.len(),
            "loaded records"
        );
        Ok(filter::apply(&records, filters, range))
    }
}

/// A source that always fails; useful for exercising error propagation.
pub struct FailingSource {
    message: String,
}

impl FailingSource {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl DataSource for FailingSource {
    fn name(&self) -> &str {
        "failing"
    }

    async fn fetch_records(&self, _: &ReportFilters, _: &DateRange) -> anyhow::Result<Vec<Record>> {
        Err(anyhow::anyhow!("{}", self.message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn march() -> DateRange {
        DateRange {
            start: Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2025, 3, 31, 0, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn fixture_filters_and_counts_calls() {
        let source = FixtureSource::new(vec![
            Record::new().with("subject", "Math").with("date", "2025-03-03"),
            Record::new().with("subject", "Art").with("date", "2025-03-04"),
        ]);
        let filters = ReportFilters {
            subjects: vec!["Art".into()],
            ..Default::default()
        };
        let records = source.fetch_records(&filters, &march()).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(source.call_count(), 1);
    }

    #[tokio::test]
    async fn json_file_source_reads_current_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");
        std::fs::write(&path, r#"[{"subject":"Math","score":80,"date":"2025-03-03"}]"#).unwrap();

        let source = JsonFileSource::new(&path);
        let first = source
            .fetch_records(&ReportFilters::default(), &march())
            .await
            .unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].number("score"), Some(80.0));

        std::fs::write(&path, "[]").unwrap();
        let second = source
            .fetch_records(&ReportFilters::default(), &march())
            .await
            .unwrap();
        assert!(second.is_empty());
    }

    #[tokio::test]
    async fn json_file_source_reports_missing_file() {
        let source = JsonFileSource::new("/no/such/records.json");
        let err = source
            .fetch_records(&ReportFilters::default(), &march())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("failed to read records"));
    }
}
