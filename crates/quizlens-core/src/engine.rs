//! Central reporting engine.
//!
//! Builds report definitions, runs the fetch → transform → aggregate → chart
//! pipeline, and persists definitions. Each stage completes before the next
//! begins and the first failure aborts the whole call.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::instrument;
use uuid::Uuid;

use crate::aggregate::compute_summary;
use crate::attendance::{
    AttendanceEvent, AttendanceFilters, AttendanceInput, AttendanceLog, AttendanceReport,
    AttendanceTracker, InMemoryAttendanceLog,
};
use crate::charts::build_charts;
use crate::config::ReportingConfig;
use crate::error::{ReportError, Result};
use crate::model::{DateRange, Record, ReportConfig, ReportDefinition, ReportFilters};
use crate::report::{CreatedReport, ReportMetadata, ReportResult};
use crate::source::DataSource;
use crate::store::ReportStore;
use crate::time_analytics::{analyze_time, TimeAnalytics};
use crate::transform::{project, shape_projected};

/// Source of "now" for the engine. Swappable so tests can pin time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant.
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Allocate a new, time-ordered report id.
pub fn new_report_id() -> String {
    format!("report_{}", Uuid::now_v7().simple())
}

/// The reporting engine.
pub struct ReportingEngine {
    source: Arc<dyn DataSource>,
    store: Arc<dyn ReportStore>,
    attendance: AttendanceTracker,
    clock: Arc<dyn Clock>,
    config: ReportingConfig,
}

impl ReportingEngine {
    pub fn new(
        source: Arc<dyn DataSource>,
        store: Arc<dyn ReportStore>,
        config: ReportingConfig,
    ) -> Self {
        Self {
            source,
            store,
            attendance: AttendanceTracker::new(Arc::new(InMemoryAttendanceLog::new())),
            clock: Arc::new(SystemClock),
            config,
        }
    }

    /// Use `log` for attendance events instead of the in-memory default.
    pub fn with_attendance_log(mut self, log: Arc<dyn AttendanceLog>) -> Self {
        self.attendance = AttendanceTracker::new(log);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &ReportingConfig {
        &self.config
    }

    /// Current time according to the engine's clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Build, generate, and persist a custom report.
    #[instrument(skip(self, config), fields(title = %config.title))]
    pub async fn create_custom_report(&self, config: ReportConfig) -> Result<CreatedReport> {
        let now = self.clock.now();
        let definition = ReportDefinition::build(config, &self.config, new_report_id(), now)?;

        let data = self.generate_report_data(&definition).await?;
        self.store.save(&definition)?;

        tracing::info!(
            id = %definition.id,
            records = data.metadata.total_records,
            charts = data.charts.len(),
            "report created"
        );

        let message = format!(
            "Report '{}' created with {} record(s)",
            definition.title, data.metadata.total_records
        );
        Ok(CreatedReport {
            report: definition,
            data,
            message,
        })
    }

    /// Run the full pipeline for `definition` against live source data.
    #[instrument(skip(self, definition), fields(id = %definition.id))]
    pub async fn generate_report_data(&self, definition: &ReportDefinition) -> Result<ReportResult> {
        let fetched = self.fetch(&definition.filters, &definition.date_range).await?;

        let projected = project(&fetched, &definition.selected_fields);
        let summary = compute_summary(&projected);
        let details = shape_projected(
            projected,
            definition.group_by.as_deref(),
            &definition.sort_by,
            definition.sort_order,
        );

        let charts = if definition.include_charts {
            build_charts(&fetched, &definition.chart_configs)
        } else {
            Vec::new()
        };

        Ok(ReportResult {
            metadata: ReportMetadata {
                total_records: summary.total_records,
                date_range: definition.date_range,
                generated_at: self.clock.now(),
            },
            summary,
            details,
            charts,
        })
    }

    /// Load a persisted definition, failing if it does not exist.
    pub fn load_definition(&self, id: &str) -> Result<ReportDefinition> {
        self.store
            .load(id)?
            .ok_or_else(|| ReportError::NotFound(id.to_string()))
    }

    pub fn list_definitions(&self) -> Result<Vec<ReportDefinition>> {
        self.store.list()
    }

    /// Re-run the pipeline for a stored definition.
    pub async fn regenerate(&self, id: &str) -> Result<(ReportDefinition, ReportResult)> {
        let definition = self.load_definition(id)?;
        let data = self.generate_report_data(&definition).await?;
        Ok((definition, data))
    }

    pub fn track_attendance(&self, input: AttendanceInput) -> Result<AttendanceEvent> {
        self.attendance.track_attendance(input)
    }

    pub fn generate_attendance_report(&self, filters: &AttendanceFilters) -> Result<AttendanceReport> {
        self.attendance.generate_attendance_report(filters)
    }

    /// Time analytics over source records. Defaults to the configured window.
    #[instrument(skip(self, filters))]
    pub async fn generate_time_analytics(
        &self,
        filters: &ReportFilters,
        range: Option<DateRange>,
    ) -> Result<TimeAnalytics> {
        let range = match range {
            Some(r) => {
                r.validate()?;
                r
            }
            None => DateRange::last_days(self.clock.now(), self.config.default_window_days),
        };
        let records = self.fetch(filters, &range).await?;
        Ok(analyze_time(&records))
    }

    async fn fetch(&self, filters: &ReportFilters, range: &DateRange) -> Result<Vec<Record>> {
        let records = self
            .source
            .fetch_records(filters, range)
            .await
            .map_err(ReportError::DataSource)?;
        tracing::debug!(source = self.source.name(), count = records.len(), "records fetched");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_ids_are_unique_and_prefixed() {
        let a = new_report_id();
        let b = new_report_id();
        assert!(a.starts_with("report_"));
        assert_ne!(a, b);
        assert!(a
            .trim_start_matches("report_")
            .chars()
            .all(|c| c.is_ascii_hexdigit()));
    }
}
