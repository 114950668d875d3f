//! JSON export: the definition and the generated data, pretty-printed.
//!
//! Unlike the tabular writers, grouped details keep their grouped shape.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use quizlens_core::error::{ReportError, Result};
use quizlens_core::model::ReportDefinition;
use quizlens_core::report::ReportResult;

/// The document written by a JSON export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedReport {
    pub report: ReportDefinition,
    pub data: ReportResult,
}

pub fn generate_json(exported: &ExportedReport) -> Result<String> {
    serde_json::to_string_pretty(exported)
        .map_err(|e| ReportError::serialization("failed to serialize report", e))
}

/// Read a JSON export back from disk.
pub fn load_json_export(path: &Path) -> anyhow::Result<ExportedReport> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let exported = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(exported)
}
