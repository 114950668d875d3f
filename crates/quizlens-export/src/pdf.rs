//! PDF export.
//!
//! Report content is first laid out as a [`ReportDocument`] (header, summary
//! block, data table) and then handed to a [`DocumentRenderer`]. The default
//! [`MinimalPdfRenderer`] writes a plain multi-page PDF 1.4 text document with
//! the built-in Helvetica font; richer backends can be plugged in without
//! touching the content model.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};

use quizlens_core::model::ReportDefinition;
use quizlens_core::report::ReportResult;

use crate::table::Table;

// ---------------------------------------------------------------------------
// Content model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryItem {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportDocument {
    pub title: String,
    pub description: String,
    pub generated_at: DateTime<Utc>,
    pub summary: Vec<SummaryItem>,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ReportDocument {
    pub fn build(definition: &ReportDefinition, data: &ReportResult, table: &Table<'_>) -> Self {
        let s = &data.summary;
        let item = |label: &str, value: String| SummaryItem {
            label: label.to_string(),
            value,
        };
        Self {
            title: definition.title.clone(),
            description: definition.description.clone(),
            generated_at: data.metadata.generated_at,
            summary: vec![
                item("Total Records", s.total_records.to_string()),
                item("Average Score", format!("{:.1}%", s.average_score)),
                item("Completion Rate", format!("{:.1}%", s.completion_rate)),
                item("Average Time", format!("{}s", s.average_time)),
            ],
            headers: table.headers.clone(),
            rows: table.text_rows(),
        }
    }

    /// The document flattened to text lines, top to bottom.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![self.title.clone()];
        if !self.description.is_empty() {
            lines.push(self.description.clone());
        }
        lines.push(format!(
            "Generated: {}",
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        lines.push(String::new());
        lines.push("Summary".into());
        for item in &self.summary {
            lines.push(format!("  {}: {}", item.label, item.value));
        }
        lines.push(String::new());
        lines.push(self.headers.join(" | "));
        if self.rows.is_empty() {
            lines.push("No records match this report.".into());
        }
        for row in &self.rows {
            lines.push(row.join(" | "));
        }
        lines
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Turns a [`ReportDocument`] into file bytes.
pub trait DocumentRenderer: Send + Sync {
    fn render(&self, document: &ReportDocument) -> anyhow::Result<Vec<u8>>;
}

const PAGE_WIDTH: u32 = 595;
const PAGE_HEIGHT: u32 = 842;
const MARGIN: u32 = 50;
const FONT_SIZE: u32 = 10;
const LEADING: u32 = 14;
const MAX_LINE_CHARS: usize = 110;

/// Text-only PDF 1.4 renderer (A4, Helvetica).
pub struct MinimalPdfRenderer {
    lines_per_page: usize,
}

impl Default for MinimalPdfRenderer {
    fn default() -> Self {
        Self {
            lines_per_page: ((PAGE_HEIGHT - 2 * MARGIN) / LEADING) as usize,
        }
    }
}

impl MinimalPdfRenderer {
    pub fn with_lines_per_page(lines_per_page: usize) -> Self {
        Self {
            lines_per_page: lines_per_page.max(1),
        }
    }
}

impl DocumentRenderer for MinimalPdfRenderer {
    fn render(&self, document: &ReportDocument) -> anyhow::Result<Vec<u8>> {
        let lines = document.lines();
        let pages: Vec<&[String]> = lines.chunks(self.lines_per_page).collect();

        // 1: catalog, 2: page tree, 3: font, then a (page, content) pair per page.
        let page_ids: Vec<usize> = (0..pages.len()).map(|i| 4 + 2 * i).collect();
        let mut objects: Vec<String> = Vec::with_capacity(3 + 2 * pages.len());
        objects.push("<< /Type /Catalog /Pages 2 0 R >>".into());
        let kids: Vec<String> = page_ids.iter().map(|id| format!("{id} 0 R")).collect();
        objects.push(format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids.join(" "),
            pages.len()
        ));
        objects.push("<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".into());

        for (page, id) in pages.iter().zip(&page_ids) {
            objects.push(format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH} {PAGE_HEIGHT}] \
                 /Resources << /Font << /F1 3 0 R >> >> /Contents {} 0 R >>",
                id + 1
            ));
            let stream = content_stream(page);
            objects.push(format!(
                "<< /Length {} >>\nstream\n{}\nendstream",
                stream.len(),
                stream
            ));
        }

        let mut out = String::from("%PDF-1.4\n");
        let mut offsets = Vec::with_capacity(objects.len());
        for (i, body) in objects.iter().enumerate() {
            offsets.push(out.len());
            write!(out, "{} 0 obj\n{}\nendobj\n", i + 1, body)?;
        }

        let xref_at = out.len();
        write!(out, "xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1)?;
        for offset in offsets {
            write!(out, "{offset:010} 00000 n \n")?;
        }
        write!(
            out,
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_at
        )?;
        Ok(out.into_bytes())
    }
}

fn content_stream(lines: &[String]) -> String {
    let mut stream = format!(
        "BT\n/F1 {FONT_SIZE} Tf\n{LEADING} TL\n{MARGIN} {} Td\n",
        PAGE_HEIGHT - MARGIN
    );
    for line in lines {
        stream.push_str(&format!("({}) Tj T*\n", escape_text(line)));
    }
    stream.push_str("ET");
    stream
}

/// Escape a line for a PDF literal string. Non-ASCII characters are replaced
/// since the base-14 font has no glyphs for them.
fn escape_text(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    for c in line.chars().take(MAX_LINE_CHARS) {
        match c {
            '\\' | '(' | ')' => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_ascii() && !c.is_ascii_control() => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}
