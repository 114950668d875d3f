//! quizlens-export: report export to PDF, CSV, JSON, and XLSX.
//!
//! [`Exporter::export_report`] reloads a stored definition, regenerates its
//! data from the live source, and writes one artifact in the requested
//! format. Artifacts are only reported once the file write has completed.

pub mod csv_writer;
pub mod json_writer;
pub mod pdf;
pub mod share;
pub mod table;
pub mod xlsx_writer;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use quizlens_core::engine::ReportingEngine;
use quizlens_core::error::{ReportError, Result};
use quizlens_core::model::ExportFormat;

use crate::json_writer::ExportedReport;
use crate::pdf::{DocumentRenderer, MinimalPdfRenderer, ReportDocument};
use crate::share::ShareTarget;
use crate::table::Table;

/// The outcome of one export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportArtifact {
    pub success: bool,
    /// Location of the written file.
    pub uri: String,
    pub file_name: String,
    pub mime_type: String,
    pub message: String,
}

pub struct Exporter {
    engine: Arc<ReportingEngine>,
    output_dir: PathBuf,
    renderer: Box<dyn DocumentRenderer>,
}

impl Exporter {
    /// An exporter writing into the engine's configured output directory.
    pub fn new(engine: Arc<ReportingEngine>) -> Self {
        let output_dir = engine.config().output_dir.clone();
        Self {
            engine,
            output_dir,
            renderer: Box::new(MinimalPdfRenderer::default()),
        }
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_renderer(mut self, renderer: Box<dyn DocumentRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Export the stored report `report_id` as `format` (case-insensitive).
    #[instrument(skip(self))]
    pub async fn export_report(&self, report_id: &str, format: &str) -> Result<ExportArtifact> {
        let format: ExportFormat = format
            .parse()
            .map_err(|_| ReportError::UnsupportedFormat(format.to_string()))?;

        let (definition, data) = self.engine.regenerate(report_id).await?;
        let registry = &self.engine.config().fields;

        let bytes = match format {
            ExportFormat::Pdf => {
                let table = Table::from_report(&definition, &data, registry);
                let document = ReportDocument::build(&definition, &data, &table);
                self.renderer
                    .render(&document)
                    .map_err(|e| ReportError::serialization("failed to render PDF", format!("{e:#}")))?
            }
            ExportFormat::Csv => {
                csv_writer::generate_csv(&Table::from_report(&definition, &data, registry))?
            }
            ExportFormat::Xlsx => {
                xlsx_writer::generate_xlsx(&Table::from_report(&definition, &data, registry))?
            }
            ExportFormat::Json => json_writer::generate_json(&ExportedReport {
                report: definition.clone(),
                data,
            })?
            .into_bytes(),
        };

        let file_name = self
            .free_file_name(artifact_file_name(&definition.title, format, self.engine.now()))
            .await;
        let path = self.output_dir.join(&file_name);
        write_artifact(&path, &bytes).await?;

        tracing::info!(
            id = report_id,
            format = %format,
            path = %path.display(),
            bytes = bytes.len(),
            "report exported"
        );

        Ok(ExportArtifact {
            success: true,
            uri: path.display().to_string(),
            file_name,
            mime_type: format.mime_type().to_string(),
            message: format!(
                "Report '{}' exported as {}",
                definition.title,
                format.extension().to_uppercase()
            ),
        })
    }

    /// Hand a finished artifact to `target`. Returns where it ended up.
    pub async fn share(&self, artifact: &ExportArtifact, target: &dyn ShareTarget) -> Result<String> {
        if !Path::new(&artifact.uri).exists() {
            return Err(ReportError::NotFound(artifact.uri.clone()));
        }
        let dest = target.share(artifact).await?;
        tracing::info!(share_target = target.name(), dest = %dest, "artifact shared");
        Ok(dest)
    }

    /// `file_name`, or `<stem>_<n>.<ext>` when a file of that name is already
    /// in the output directory.
    async fn free_file_name(&self, file_name: String) -> String {
        let taken = |name: &str| tokio::fs::try_exists(self.output_dir.join(name));
        if !taken(&file_name).await.unwrap_or(false) {
            return file_name;
        }
        let (stem, ext) = file_name
            .rsplit_once('.')
            .unwrap_or((file_name.as_str(), ""));
        let mut n = 1;
        loop {
            let candidate = format!("{stem}_{n}.{ext}");
            if !taken(&candidate).await.unwrap_or(false) {
                return candidate;
            }
            n += 1;
        }
    }
}

/// `<title>_<epoch-millis>.<ext>`, with whitespace runs in the title collapsed
/// to `_` and path separators removed.
pub fn artifact_file_name(title: &str, format: ExportFormat, at: DateTime<Utc>) -> String {
    let cleaned: String = title
        .chars()
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();
    let stem = cleaned.split_whitespace().collect::<Vec<_>>().join("_");
    let stem = if stem.is_empty() { "report".to_string() } else { stem };
    format!("{stem}_{}.{}", at.timestamp_millis(), format.extension())
}

async fn write_artifact(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(|e| {
            ReportError::serialization(&format!("failed to create {}", parent.display()), e)
        })?;
    }
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| ReportError::serialization(&format!("failed to write {}", path.display()), e))
}
