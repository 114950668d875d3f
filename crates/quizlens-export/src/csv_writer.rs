//! CSV export.
//!
//! The header line holds field labels joined by commas. Every data value is
//! quoted; missing cells are written as empty quoted values.

use csv::{QuoteStyle, WriterBuilder};

use quizlens_core::error::{ReportError, Result};

use crate::table::{cell_text, Table};

/// Serialize a table to CSV bytes.
pub fn generate_csv(table: &Table<'_>) -> Result<Vec<u8>> {
    let mut header = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .from_writer(Vec::new());
    header.write_record(&table.headers).map_err(csv_error)?;
    let buf = header
        .into_inner()
        .map_err(|e| ReportError::serialization("failed to flush CSV header", e))?;

    let mut body = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .from_writer(buf);
    for row in &table.rows {
        body.write_record(row.iter().map(|cell| cell_text(*cell)))
            .map_err(csv_error)?;
    }
    body.into_inner()
        .map_err(|e| ReportError::serialization("failed to flush CSV rows", e))
}

fn csv_error(err: csv::Error) -> ReportError {
    ReportError::serialization("failed to write CSV", err)
}
