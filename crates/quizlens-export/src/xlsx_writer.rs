//! XLSX export: a single "Report" worksheet mirroring the CSV layout.

use rust_xlsxwriter::{Format, Workbook, XlsxError};

use quizlens_core::error::{ReportError, Result};
use quizlens_core::model::FieldValue;

use crate::table::Table;

pub const SHEET_NAME: &str = "Report";

/// Serialize a table to an in-memory xlsx workbook.
pub fn generate_xlsx(table: &Table<'_>) -> Result<Vec<u8>> {
    build_workbook(table).map_err(|e| ReportError::serialization("failed to write xlsx", e))
}

fn build_workbook(table: &Table<'_>) -> std::result::Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col, header) in table.headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, header, &header_format)?;
        // Rough fit: Excel widths are in characters.
        worksheet.set_column_width(col as u16, (header.len().max(10) + 2) as f64)?;
    }

    for (i, row) in table.rows.iter().enumerate() {
        let r = (i + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            match cell {
                Some(FieldValue::Number(n)) => {
                    worksheet.write_number(r, col as u16, *n)?;
                }
                Some(FieldValue::Text(s)) => {
                    worksheet.write_string(r, col as u16, s)?;
                }
                None => {}
            }
        }
    }

    workbook.save_to_buffer()
}
