//! Row/column layout shared by the tabular writers (CSV, XLSX, PDF).
//!
//! Grouped details are flattened back to rows in bucket order. Columns are
//! the keys of the first row, or the selected fields when there are no rows.

use quizlens_core::fields::FieldRegistry;
use quizlens_core::model::{FieldValue, ReportDefinition};
use quizlens_core::report::ReportResult;

pub struct Table<'a> {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<&'a FieldValue>>>,
}

impl<'a> Table<'a> {
    pub fn from_report(
        definition: &ReportDefinition,
        data: &'a ReportResult,
        registry: &FieldRegistry,
    ) -> Self {
        let records = data.details.rows();
        let keys: Vec<String> = match records.first() {
            Some(first) => first.keys().map(str::to_string).collect(),
            None => definition.selected_fields.clone(),
        };
        let headers = keys
            .iter()
            .map(|k| registry.label_or_key(k).to_string())
            .collect();
        let rows = records
            .into_iter()
            .map(|record| keys.iter().map(|k| record.get(k)).collect())
            .collect();
        Self {
            headers,
            rows,
        }
    }

    /// Rows rendered as display strings; missing cells are empty.
    pub fn text_rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| row.iter().map(|cell| cell_text(*cell)).collect())
            .collect()
    }
}

pub fn cell_text(cell: Option<&FieldValue>) -> String {
    cell.map(|v| v.to_string()).unwrap_or_default()
}
