//! Handing exported artifacts to the host's sharing facility.

use std::path::PathBuf;

use async_trait::async_trait;

use quizlens_core::error::{ReportError, Result};

use crate::ExportArtifact;

/// A destination that can receive an exported file.
#[async_trait]
pub trait ShareTarget: Send + Sync {
    fn name(&self) -> &str;

    async fn share(&self, artifact: &ExportArtifact) -> Result<String>;
}

/// Used when the host has no sharing capability.
pub struct NoShareTarget;

#[async_trait]
impl ShareTarget for NoShareTarget {
    fn name(&self) -> &str {
        "none"
    }

    async fn share(&self, _: &ExportArtifact) -> Result<String> {
        Err(ReportError::NotAvailable(
            "sharing is not available on this host".into(),
        ))
    }
}

/// Copies artifacts into a shared directory (a synced folder, a mount, ...).
pub struct DirectoryShareTarget {
    dir: PathBuf,
}

impl DirectoryShareTarget {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl ShareTarget for DirectoryShareTarget {
    fn name(&self) -> &str {
        "directory"
    }

    async fn share(&self, artifact: &ExportArtifact) -> Result<String> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            ReportError::serialization(&format!("failed to create {}", self.dir.display()), e)
        })?;
        let dest = self.dir.join(&artifact.file_name);
        tokio::fs::copy(&artifact.uri, &dest).await.map_err(|e| {
            ReportError::serialization(&format!("failed to copy {}", artifact.uri), e)
        })?;
        tracing::info!(from = %artifact.uri, to = %dest.display(), "artifact shared");
        Ok(dest.display().to_string())
    }
}
