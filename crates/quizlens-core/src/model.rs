//! Core data model types for quizlens.
//!
//! Records, filters, report configuration and the persisted report definition.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::config::ReportingConfig;
use crate::error::{ReportError, Result};
use crate::fields::{self, FieldRegistry};

// ---------------------------------------------------------------------------
// Field values and records
// ---------------------------------------------------------------------------

/// A single value stored in a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Numeric view of the value. Numeric strings are accepted.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(s) => s.trim().parse().ok(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::Number(_) => None,
        }
    }

    /// Total order used for sorting: numbers before text, numbers numerically,
    /// text lexically.
    pub fn compare(&self, other: &FieldValue) -> Ordering {
        match (self, other) {
            (FieldValue::Number(a), FieldValue::Number(b)) => a.total_cmp(b),
            (FieldValue::Text(a), FieldValue::Text(b)) => a.cmp(b),
            (FieldValue::Number(_), FieldValue::Text(_)) => Ordering::Less,
            (FieldValue::Text(_), FieldValue::Number(_)) => Ordering::Greater,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(n) => write!(f, "{n}"),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

impl From<u32> for FieldValue {
    fn from(n: u32) -> Self {
        FieldValue::Number(f64::from(n))
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

/// One observed event as a flat key/value map.
///
/// Keys keep insertion order, which serializers use for column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, FieldValue)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace a value. Replacing keeps the original position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(FieldValue::as_f64)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(FieldValue::as_str)
    }

    /// Parsed `date` field, if present and well-formed.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.text(fields::DATE).and_then(parse_timestamp)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct RecordVisitor;

        impl<'de> Visitor<'de> for RecordVisitor {
            type Value = Record;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of field keys to numbers or strings")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut access: A,
            ) -> std::result::Result<Record, A::Error> {
                let mut record = Record::new();
                while let Some((key, value)) = access.next_entry::<String, FieldValue>()? {
                    record.insert(key, value);
                }
                Ok(record)
            }
        }

        deserializer.deserialize_map(RecordVisitor)
    }
}

/// Parse an ISO-8601 timestamp or plain date into UTC.
///
/// Accepts RFC 3339, naive `YYYY-MM-DDTHH:MM:SS[.f]` (taken as UTC) and
/// `YYYY-MM-DD` (midnight UTC).
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

// ---------------------------------------------------------------------------
// Query shape
// ---------------------------------------------------------------------------

/// Inclusive time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        let range = Self { start, end };
        range.validate()?;
        Ok(range)
    }

    /// The `days`-long window ending at `now`.
    pub fn last_days(now: DateTime<Utc>, days: i64) -> Self {
        Self {
            start: now - Duration::days(days),
            end: now,
        }
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts <= self.end
    }

    pub fn validate(&self) -> Result<()> {
        if self.start > self.end {
            return Err(ReportError::Validation(format!(
                "date range start {} is after end {}",
                self.start.to_rfc3339(),
                self.end.to_rfc3339()
            )));
        }
        Ok(())
    }
}

/// Category filters. An empty list places no constraint on its category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportFilters {
    pub students: Vec<String>,
    pub classes: Vec<String>,
    pub subjects: Vec<String>,
    pub quiz_types: Vec<String>,
    pub difficulty_levels: Vec<String>,
}

/// Kind of report being built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    Performance,
    Attendance,
    TimeAnalytics,
    Engagement,
    #[default]
    Custom,
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportType::Performance => write!(f, "performance"),
            ReportType::Attendance => write!(f, "attendance"),
            ReportType::TimeAnalytics => write!(f, "time_analytics"),
            ReportType::Engagement => write!(f, "engagement"),
            ReportType::Custom => write!(f, "custom"),
        }
    }
}

impl FromStr for ReportType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "performance" => Ok(ReportType::Performance),
            "attendance" => Ok(ReportType::Attendance),
            "time_analytics" | "time" => Ok(ReportType::TimeAnalytics),
            "engagement" => Ok(ReportType::Engagement),
            "custom" => Ok(ReportType::Custom),
            other => Err(format!("unknown report type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Asc => write!(f, "asc"),
            SortOrder::Desc => write!(f, "desc"),
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortOrder::Asc),
            "desc" | "descending" => Ok(SortOrder::Desc),
            other => Err(format!("unknown sort order: {other}")),
        }
    }
}

/// Output encodings a report can be exported to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Pdf,
    Csv,
    Xlsx,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Json => "json",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Csv => "text/csv",
            ExportFormat::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            ExportFormat::Json => "application/json",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pdf" => Ok(ExportFormat::Pdf),
            "csv" => Ok(ExportFormat::Csv),
            "xlsx" | "excel" => Ok(ExportFormat::Xlsx),
            "json" => Ok(ExportFormat::Json),
            other => Err(format!("unknown export format: {other}")),
        }
    }
}

/// A requested chart. `chart_type` is kept as free text so that unknown
/// kinds survive persistence and are skipped at generation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSpec {
    #[serde(rename = "type")]
    pub chart_type: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_axis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_axis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ChartSpec {
    pub fn bar(title: &str, x_axis: &str, y_axis: &str) -> Self {
        Self {
            chart_type: "bar".into(),
            title: title.into(),
            x_axis: Some(x_axis.into()),
            y_axis: Some(y_axis.into()),
            field: None,
        }
    }

    pub fn line(title: &str, y_axis: &str) -> Self {
        Self {
            chart_type: "line".into(),
            title: title.into(),
            x_axis: Some(fields::DATE.into()),
            y_axis: Some(y_axis.into()),
            field: None,
        }
    }

    pub fn pie(title: &str, field: &str) -> Self {
        Self {
            chart_type: "pie".into(),
            title: title.into(),
            x_axis: None,
            y_axis: None,
            field: Some(field.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Report configuration and definition
// ---------------------------------------------------------------------------

/// Caller-supplied report configuration. Everything but the title is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportConfig {
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub report_type: Option<String>,
    pub date_range: Option<DateRange>,
    pub filters: ReportFilters,
    pub selected_fields: Option<Vec<String>>,
    pub group_by: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub chart_configs: Vec<ChartSpec>,
    pub format: Option<String>,
    pub include_charts: Option<bool>,
    pub created_by: Option<String>,
}

impl ReportConfig {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }
}

/// The persisted description of a report. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDefinition {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub report_type: ReportType,
    pub date_range: DateRange,
    pub filters: ReportFilters,
    pub selected_fields: Vec<String>,
    pub group_by: Option<String>,
    pub sort_by: String,
    pub sort_order: SortOrder,
    pub chart_configs: Vec<ChartSpec>,
    pub format: ExportFormat,
    pub include_charts: bool,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}

impl ReportDefinition {
    /// Apply defaults to `config` and validate it against the registry.
    pub fn build(
        config: ReportConfig,
        settings: &ReportingConfig,
        id: String,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let registry: &FieldRegistry = &settings.fields;

        let title = config.title.trim().to_string();
        if title.is_empty() {
            return Err(ReportError::Validation("report title is required".into()));
        }

        let report_type = match config.report_type.as_deref() {
            Some(t) => t.parse().map_err(ReportError::Validation)?,
            None => ReportType::default(),
        };

        let date_range = config
            .date_range
            .unwrap_or_else(|| DateRange::last_days(now, settings.default_window_days));
        date_range.validate()?;

        let selected_fields = match config.selected_fields {
            Some(selected) if !selected.is_empty() => {
                for key in &selected {
                    registry.require(key, "selected field")?;
                }
                selected
            }
            _ => registry.keys(),
        };

        if let Some(group_by) = &config.group_by {
            registry.require(group_by, "groupBy")?;
            if !selected_fields.contains(group_by) {
                return Err(ReportError::Validation(format!(
                    "groupBy '{group_by}' must be one of the selected fields"
                )));
            }
        }

        let sort_by = match config.sort_by {
            Some(key) => key,
            None => default_sort_key(registry)?,
        };
        registry.require(&sort_by, "sortBy")?;

        let sort_order = match config.sort_order.as_deref() {
            Some(o) => o.parse().map_err(ReportError::Validation)?,
            None => SortOrder::default(),
        };

        let format = match config.format.as_deref() {
            Some(f) => f.parse().map_err(ReportError::Validation)?,
            None => ExportFormat::default(),
        };

        Ok(Self {
            id,
            title,
            description: config.description.unwrap_or_default(),
            report_type,
            date_range,
            filters: config.filters,
            selected_fields,
            group_by: config.group_by,
            sort_by,
            sort_order,
            chart_configs: config.chart_configs,
            format,
            include_charts: config.include_charts.unwrap_or(true),
            created_at: now,
            created_by: config
                .created_by
                .unwrap_or_else(|| settings.default_author.clone()),
        })
    }
}

/// `student_name` when the registry has it, otherwise the first registry key.
fn default_sort_key(registry: &FieldRegistry) -> Result<String> {
    if registry.contains(fields::STUDENT_NAME) {
        return Ok(fields::STUDENT_NAME.to_string());
    }
    registry
        .fields()
        .first()
        .map(|f| f.key.clone())
        .ok_or_else(|| ReportError::Validation("field registry is empty".into()))
}
