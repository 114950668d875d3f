//! Engine configuration and loading.
//!
//! The configuration is an explicit value handed to the engine and exporter;
//! nothing in the pipeline reads global state.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::fields::FieldRegistry;

/// Top-level quizlens configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportingConfig {
    /// Recognized fields and their labels.
    #[serde(default)]
    pub fields: FieldRegistry,
    /// Length of the default reporting window, in days.
    #[serde(default = "default_window_days")]
    pub default_window_days: i64,
    /// `createdBy` value for reports that do not name an author.
    #[serde(default = "default_author")]
    pub default_author: String,
    /// Where exported artifacts are written.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Where report definitions are persisted.
    #[serde(default = "default_store_dir")]
    pub store_dir: PathBuf,
    /// Append-only attendance log (JSON lines).
    #[serde(default = "default_attendance_log")]
    pub attendance_log: PathBuf,
}

fn default_window_days() -> i64 {
    30
}
fn default_author() -> String {
    "system".to_string()
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./quizlens-exports")
}
fn default_store_dir() -> PathBuf {
    PathBuf::from("./.quizlens/reports")
}
fn default_attendance_log() -> PathBuf {
    PathBuf::from("./.quizlens/attendance.jsonl")
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            fields: FieldRegistry::standard(),
            default_window_days: default_window_days(),
            default_author: default_author(),
            output_dir: default_output_dir(),
            store_dir: default_store_dir(),
            attendance_log: default_attendance_log(),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

fn resolve_path(path: &Path) -> PathBuf {
    PathBuf::from(resolve_env_vars(&path.to_string_lossy()))
}

/// Load config from an explicit path, or search the default locations.
///
/// Search order without a path:
/// 1. `quizlens.toml` in the current directory
/// 2. `~/.config/quizlens/config.toml`
///
/// Environment variable overrides: `QUIZLENS_OUTPUT_DIR`, `QUIZLENS_STORE_DIR`.
pub fn load_config_from(path: Option<&Path>) -> Result<ReportingConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("quizlens.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => ReportingConfig::default(),
    };

    if let Ok(dir) = std::env::var("QUIZLENS_OUTPUT_DIR") {
        config.output_dir = PathBuf::from(dir);
    }
    if let Ok(dir) = std::env::var("QUIZLENS_STORE_DIR") {
        config.store_dir = PathBuf::from(dir);
    }

    config.output_dir = resolve_path(&config.output_dir);
    config.store_dir = resolve_path(&config.store_dir);
    config.attendance_log = resolve_path(&config.attendance_log);

    tracing::debug!(
        output_dir = %config.output_dir.display(),
        store_dir = %config.store_dir.display(),
        fields = config.fields.fields().len(),
        "configuration loaded"
    );

    Ok(config)
}

/// Parse a TOML configuration document.
pub fn parse_config(content: &str) -> Result<ReportingConfig> {
    let config: ReportingConfig = toml::from_str(content)?;
    anyhow::ensure!(
        config.default_window_days >= 0,
        "default_window_days must not be negative"
    );
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("quizlens"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("_QUIZLENS_TEST_VAR", "hello");
        assert_eq!(resolve_env_vars("${_QUIZLENS_TEST_VAR}"), "hello");
        assert_eq!(
            resolve_env_vars("prefix_${_QUIZLENS_TEST_VAR}_suffix"),
            "prefix_hello_suffix"
        );
        std::env::remove_var("_QUIZLENS_TEST_VAR");
    }

    #[test]
    fn default_config() {
        let config = ReportingConfig::default();
        assert_eq!(config.default_window_days, 30);
        assert_eq!(config.default_author, "system");
        assert!(config.fields.contains("score"));
    }

    #[test]
    fn parse_custom_registry() {
        let toml_str = r#"
default_window_days = 7
default_author = "ms.rivera"
output_dir = "/tmp/exports"

[[fields]]
key = "student_name"
label = "Learner"

[[fields]]
key = "score"
label = "Points"
"#;
        let config = parse_config(toml_str).unwrap();
        assert_eq!(config.default_window_days, 7);
        assert_eq!(config.default_author, "ms.rivera");
        assert_eq!(config.fields.label("student_name"), Some("Learner"));
        assert!(!config.fields.contains("class"));
        assert_eq!(config.output_dir, PathBuf::from("/tmp/exports"));
    }

    #[test]
    fn negative_window_rejected() {
        assert!(parse_config("default_window_days = -1").is_err());
    }

    #[test]
    fn explicit_missing_path_fails() {
        let err = load_config_from(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }
}
