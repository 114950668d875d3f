//! Report definition persistence.
//!
//! Stores upsert by id with last-write-wins semantics. A missing id is a
//! normal `Ok(None)`, not an error.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::{ReportError, Result};
use crate::model::ReportDefinition;

/// Persistence for [`ReportDefinition`]s.
pub trait ReportStore: Send + Sync {
    /// Insert or replace the definition stored under its id.
    fn save(&self, definition: &ReportDefinition) -> Result<()>;

    /// Fetch a definition by id.
    fn load(&self, id: &str) -> Result<Option<ReportDefinition>>;

    /// All stored definitions, oldest first.
    fn list(&self) -> Result<Vec<ReportDefinition>>;
}

/// Process-local store.
#[derive(Default)]
pub struct InMemoryReportStore {
    definitions: RwLock<HashMap<String, ReportDefinition>>,
}

impl InMemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReportStore for InMemoryReportStore {
    fn save(&self, definition: &ReportDefinition) -> Result<()> {
        let mut map = self
            .definitions
            .write()
            .map_err(|_| ReportError::Serialization("report store lock poisoned".into()))?;
        map.insert(definition.id.clone(), definition.clone());
        Ok(())
    }

    fn load(&self, id: &str) -> Result<Option<ReportDefinition>> {
        let map = self
            .definitions
            .read()
            .map_err(|_| ReportError::Serialization("report store lock poisoned".into()))?;
        Ok(map.get(id).cloned())
    }

    fn list(&self) -> Result<Vec<ReportDefinition>> {
        let map = self
            .definitions
            .read()
            .map_err(|_| ReportError::Serialization("report store lock poisoned".into()))?;
        let mut all: Vec<ReportDefinition> = map.values().cloned().collect();
        sort_oldest_first(&mut all);
        Ok(all)
    }
}

/// One pretty-printed JSON file per definition under a directory.
pub struct JsonFileReportStore {
    dir: PathBuf,
}

impl JsonFileReportStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, id: &str) -> Result<PathBuf> {
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(ReportError::Validation(format!("invalid report id '{id}'")));
        }
        Ok(self.dir.join(format!("{id}.json")))
    }
}

impl ReportStore for JsonFileReportStore {
    fn save(&self, definition: &ReportDefinition) -> Result<()> {
        let path = self.path_for(&definition.id)?;
        let json = serde_json::to_string_pretty(definition)
            .map_err(|e| ReportError::serialization("failed to serialize report definition", e))?;
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            ReportError::serialization(&format!("failed to create {}", self.dir.display()), e)
        })?;
        std::fs::write(&path, json).map_err(|e| {
            ReportError::serialization(&format!("failed to write {}", path.display()), e)
        })?;
        Ok(())
    }

    fn load(&self, id: &str) -> Result<Option<ReportDefinition>> {
        let path = match self.path_for(id) {
            Ok(path) => path,
            Err(_) => return Ok(None),
        };
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path).map_err(|e| {
            ReportError::serialization(&format!("failed to read {}", path.display()), e)
        })?;
        let definition = serde_json::from_str(&content).map_err(|e| {
            ReportError::serialization(&format!("failed to parse {}", path.display()), e)
        })?;
        Ok(Some(definition))
    }

    fn list(&self) -> Result<Vec<ReportDefinition>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let entries = std::fs::read_dir(&self.dir).map_err(|e| {
            ReportError::serialization(&format!("failed to list {}", self.dir.display()), e)
        })?;

        let mut all = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let parsed = std::fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|c| {
                    serde_json::from_str::<ReportDefinition>(&c).map_err(|e| e.to_string())
                });
            match parsed {
                Ok(definition) => all.push(definition),
                Err(e) => tracing::warn!("skipping {}: {}", path.display(), e),
            }
        }
        sort_oldest_first(&mut all);
        Ok(all)
    }
}

fn sort_oldest_first(definitions: &mut [ReportDefinition]) {
    definitions.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReportingConfig;
    use crate::model::ReportConfig;
    use chrono::{Duration, TimeZone, Utc};

    fn definition(id: &str, title: &str, minutes: i64) -> ReportDefinition {
        let now = Utc.with_ymd_and_hms(2025, 3, 15, 12, 0, 0).unwrap() + Duration::minutes(minutes);
        ReportDefinition::build(
            ReportConfig::new(title),
            &ReportingConfig::default(),
            id.to_string(),
            now,
        )
        .unwrap()
    }

    fn exercise(store: &dyn ReportStore) {
        assert_eq!(store.load("report_missing").unwrap(), None);

        store.save(&definition("report_b", "Second", 5)).unwrap();
        store.save(&definition("report_a", "First", 0)).unwrap();
        assert_eq!(store.load("report_a").unwrap().unwrap().title, "First");

        // Upsert: last write wins, saving twice is harmless.
        let replaced = definition("report_a", "First (edited)", 0);
        store.save(&replaced).unwrap();
        store.save(&replaced).unwrap();
        assert_eq!(store.load("report_a").unwrap(), Some(replaced));

        let ids: Vec<String> = store.list().unwrap().into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["report_a", "report_b"]);
    }

    #[test]
    fn in_memory_store_semantics() {
        exercise(&InMemoryReportStore::new());
    }

    #[test]
    fn json_file_store_semantics() {
        let dir = tempfile::tempdir().unwrap();
        exercise(&JsonFileReportStore::new(dir.path().join("defs")));
    }

    #[test]
    fn json_file_store_rejects_path_like_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileReportStore::new(dir.path());
        assert_eq!(store.load("../etc/passwd").unwrap(), None);
        let err = store.save(&definition("../escape", "Bad", 0)).unwrap_err();
        assert!(matches!(err, ReportError::Validation(_)));
    }

    #[test]
    fn json_file_store_skips_corrupt_files_in_list() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileReportStore::new(dir.path());
        store.save(&definition("report_ok", "Fine", 0)).unwrap();
        std::fs::write(dir.path().join("report_bad.json"), "{not json").unwrap();
        assert_eq!(store.list().unwrap().len(), 1);
    }
}
