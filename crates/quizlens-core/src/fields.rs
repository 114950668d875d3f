//! The field registry: the closed set of record keys the engine understands.
//!
//! Every other component validates keys against a [`FieldRegistry`] that is
//! passed in explicitly, so tests and embedders can substitute their own.

use serde::{Deserialize, Serialize};

use crate::error::{ReportError, Result};

pub const STUDENT_NAME: &str = "student_name";
pub const STUDENT_ID: &str = "student_id";
pub const CLASS: &str = "class";
pub const SUBJECT: &str = "subject";
pub const QUIZ_TITLE: &str = "quiz_title";
pub const QUIZ_TYPE: &str = "quiz_type";
pub const DIFFICULTY: &str = "difficulty";
pub const SCORE: &str = "score";
pub const TIME_TAKEN: &str = "time_taken";
pub const COMPLETION_RATE: &str = "completion_rate";
pub const ATTEMPTS: &str = "attempts";
pub const DATE: &str = "date";

const STANDARD_FIELDS: &[(&str, &str)] = &[
    (STUDENT_NAME, "Student Name"),
    (STUDENT_ID, "Student ID"),
    (CLASS, "Class"),
    (SUBJECT, "Subject"),
    (QUIZ_TITLE, "Quiz Title"),
    (QUIZ_TYPE, "Quiz Type"),
    (DIFFICULTY, "Difficulty"),
    (SCORE, "Score"),
    (TIME_TAKEN, "Time Taken (s)"),
    (COMPLETION_RATE, "Completion Rate"),
    (ATTEMPTS, "Attempts"),
    (DATE, "Date"),
];

/// A recognized record key and its display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub key: String,
    pub label: String,
}

/// Ordered set of recognized fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<FieldDef>", into = "Vec<FieldDef>")]
pub struct FieldRegistry {
    fields: Vec<FieldDef>,
}

impl FieldRegistry {
    /// Build a registry from explicit definitions.
    ///
    /// Keys must be non-empty and unique.
    pub fn new(fields: Vec<FieldDef>) -> Result<Self> {
        for (i, field) in fields.iter().enumerate() {
            if field.key.trim().is_empty() {
                return Err(ReportError::Validation(format!(
                    "field #{} has an empty key",
                    i + 1
                )));
            }
            if fields[..i].iter().any(|f| f.key == field.key) {
                return Err(ReportError::Validation(format!(
                    "duplicate field key '{}'",
                    field.key
                )));
            }
        }
        Ok(Self { fields })
    }

    /// The quiz-attempt registry used when no custom one is configured.
    pub fn standard() -> Self {
        Self {
            fields: STANDARD_FIELDS
                .iter()
                .map(|(key, label)| FieldDef {
                    key: (*key).to_string(),
                    label: (*label).to_string(),
                })
                .collect(),
        }
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// All keys in registry order.
    pub fn keys(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.key.clone()).collect()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.iter().any(|f| f.key == key)
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.key == key)
            .map(|f| f.label.as_str())
    }

    /// Display label for a key, falling back to the key itself.
    pub fn label_or_key<'a>(&'a self, key: &'a str) -> &'a str {
        self.label(key).unwrap_or(key)
    }

    /// Fail with a validation error naming `role` if `key` is not registered.
    pub fn require(&self, key: &str, role: &str) -> Result<()> {
        if self.contains(key) {
            Ok(())
        } else {
            Err(ReportError::Validation(format!(
                "{role} '{key}' is not a recognized field"
            )))
        }
    }
}

impl Default for FieldRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl TryFrom<Vec<FieldDef>> for FieldRegistry {
    type Error = ReportError;

    fn try_from(fields: Vec<FieldDef>) -> Result<Self> {
        Self::new(fields)
    }
}

impl From<FieldRegistry> for Vec<FieldDef> {
    fn from(registry: FieldRegistry) -> Self {
        registry.fields
    }
}
