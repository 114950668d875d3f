//! Report engine error types.
//!
//! Every pipeline stage is fail-fast: the first error aborts the operation and
//! is returned to the caller as one of these variants. Collaborator failures
//! (data sources) are carried as the original `anyhow::Error` so callers can
//! still downcast them.

use thiserror::Error;

/// Errors produced while building, generating, persisting, or exporting a report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The report configuration is malformed (unknown field, bad range, ...).
    #[error("invalid report configuration: {0}")]
    Validation(String),

    /// No report definition is stored under the requested id.
    #[error("report not found: {0}")]
    NotFound(String),

    /// The data source failed to produce records.
    #[error("data source error: {0:#}")]
    DataSource(#[source] anyhow::Error),

    /// Export was requested in a format with no serializer.
    #[error("unsupported export format: {0}")]
    UnsupportedFormat(String),

    /// A serializer or the underlying file write failed.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The host exposes no capability for the requested action.
    #[error("not available: {0}")]
    NotAvailable(String),
}

impl ReportError {
    /// Returns `true` if the error was caused by the caller's input rather than
    /// an operational failure.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ReportError::Validation(_)
                | ReportError::NotFound(_)
                | ReportError::UnsupportedFormat(_)
        )
    }

    /// Build a `Serialization` error with a short context prefix.
    pub fn serialization(context: &str, err: impl std::fmt::Display) -> Self {
        ReportError::Serialization(format!("{context}: {err}"))
    }
}

impl From<std::io::Error> for ReportError {
    fn from(err: std::io::Error) -> Self {
        ReportError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for ReportError {
    fn from(err: serde_json::Error) -> Self {
        ReportError::Serialization(err.to_string())
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = ReportError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_are_classified() {
        assert!(ReportError::Validation("x".into()).is_client_error());
        assert!(ReportError::NotFound("report_1".into()).is_client_error());
        assert!(ReportError::UnsupportedFormat("docx".into()).is_client_error());
        assert!(!ReportError::Serialization("disk full".into()).is_client_error());
        assert!(!ReportError::DataSource(anyhow::anyhow!("offline")).is_client_error());
    }

    #[test]
    fn data_source_error_keeps_chain() {
        let inner = anyhow::anyhow!("connection refused").context("querying attempts");
        let err = ReportError::DataSource(inner);
        let msg = err.to_string();
        assert!(msg.contains("querying attempts"));
        assert!(msg.contains("connection refused"));
    }
}
