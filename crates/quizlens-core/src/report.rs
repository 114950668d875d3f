//! Generated report types.
//!
//! A [`ReportResult`] is never persisted; it is rebuilt from live data on
//! every generation or export.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{DateRange, Record, ReportDefinition};

/// A bucket of records sharing one `groupBy` value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupedRecord {
    pub group: String,
    pub items: Vec<Record>,
    pub count: usize,
    pub average_score: f64,
}

/// Report rows, flat or grouped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReportDetails {
    Flat(Vec<Record>),
    Grouped(Vec<GroupedRecord>),
}

impl ReportDetails {
    /// Number of underlying records.
    pub fn record_count(&self) -> usize {
        match self {
            ReportDetails::Flat(records) => records.len(),
            ReportDetails::Grouped(groups) => groups.iter().map(|g| g.count).sum(),
        }
    }

    pub fn is_grouped(&self) -> bool {
        matches!(self, ReportDetails::Grouped(_))
    }

    /// Records as rows: grouped details are flattened in bucket order.
    pub fn rows(&self) -> Vec<&Record> {
        match self {
            ReportDetails::Flat(records) => records.iter().collect(),
            ReportDetails::Grouped(groups) => groups.iter().flat_map(|g| g.items.iter()).collect(),
        }
    }
}

impl Default for ReportDetails {
    fn default() -> Self {
        ReportDetails::Flat(Vec::new())
    }
}

/// Headline numbers shown atop every report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryStats {
    pub total_records: usize,
    pub average_score: f64,
    pub highest_score: f64,
    pub lowest_score: f64,
    pub average_time: f64,
    pub completion_rate: f64,
}

/// Chart kinds the chart builder knows how to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Line,
    Pie,
}

/// A chart payload ready to hand to a charting surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    #[serde(rename = "type")]
    pub kind: ChartKind,
    pub title: String,
    pub labels: Vec<String>,
    pub data: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
    pub total_records: usize,
    pub date_range: DateRange,
    pub generated_at: DateTime<Utc>,
}

/// The output of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportResult {
    pub summary: SummaryStats,
    pub details: ReportDetails,
    pub charts: Vec<ChartData>,
    pub metadata: ReportMetadata,
}

/// Returned by `create_custom_report`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedReport {
    pub report: ReportDefinition,
    pub data: ReportResult,
    pub message: String,
}
