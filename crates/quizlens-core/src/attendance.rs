//! Attendance tracking and attendance reports.
//!
//! Attendance events form an append-only log: they are created by
//! [`AttendanceTracker::track_attendance`] and never mutated or deleted.

use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ReportError, Result};
use crate::model::DateRange;
use crate::transform::mean;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttendanceStatus::Present => write!(f, "present"),
            AttendanceStatus::Absent => write!(f, "absent"),
            AttendanceStatus::Late => write!(f, "late"),
        }
    }
}

impl std::str::FromStr for AttendanceStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "present" => Ok(AttendanceStatus::Present),
            "absent" => Ok(AttendanceStatus::Absent),
            "late" => Ok(AttendanceStatus::Late),
            other => Err(format!("unknown attendance status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipationLevel {
    Full,
    Partial,
    Minimal,
}

impl std::str::FromStr for ParticipationLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "full" => Ok(ParticipationLevel::Full),
            "partial" => Ok(ParticipationLevel::Partial),
            "minimal" => Ok(ParticipationLevel::Minimal),
            other => Err(format!("unknown participation level: {other}")),
        }
    }
}

/// One recorded quiz session for one student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceEvent {
    pub id: String,
    pub student_id: String,
    pub quiz_id: String,
    pub class_id: String,
    pub date: DateTime<Utc>,
    pub status: AttendanceStatus,
    pub participation_level: ParticipationLevel,
    /// Seconds spent in the session.
    pub time_spent: f64,
    pub questions_answered: u32,
    pub completion_percentage: f64,
}

/// Input to [`AttendanceTracker::track_attendance`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceInput {
    pub student_id: String,
    pub quiz_id: String,
    pub class_id: String,
    /// Defaults to the time of tracking.
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    pub status: AttendanceStatus,
    pub participation_level: ParticipationLevel,
    #[serde(default)]
    pub time_spent: f64,
    #[serde(default)]
    pub questions_answered: u32,
    #[serde(default)]
    pub completion_percentage: f64,
}

/// Which events an attendance report covers. Empty lists do not constrain.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AttendanceFilters {
    pub student_ids: Vec<String>,
    pub class_ids: Vec<String>,
    pub quiz_ids: Vec<String>,
    pub date_range: Option<DateRange>,
}

impl AttendanceFilters {
    pub fn matches(&self, event: &AttendanceEvent) -> bool {
        let allowed = |list: &[String], value: &str| list.is_empty() || list.iter().any(|v| v == value);
        allowed(&self.student_ids, &event.student_id)
            && allowed(&self.class_ids, &event.class_id)
            && allowed(&self.quiz_ids, &event.quiz_id)
            && self.date_range.map_or(true, |r| r.contains(event.date))
    }
}

/// Presence rate for one ISO week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyPresence {
    /// `YYYY-Www`.
    pub week: String,
    pub sessions: usize,
    pub presence_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceReport {
    pub total_sessions: usize,
    pub present_count: usize,
    pub absent_count: usize,
    pub late_count: usize,
    pub average_participation: f64,
    pub weekly_trend: Vec<WeeklyPresence>,
}

/// ISO week label, e.g. `2025-W09`.
pub fn iso_week_label(ts: DateTime<Utc>) -> String {
    let week = ts.iso_week();
    format!("{}-W{:02}", week.year(), week.week())
}

/// Summarize a set of events. Late arrivals count as present for the
/// weekly presence rate.
pub fn summarize_attendance(events: &[AttendanceEvent]) -> AttendanceReport {
    let count = |status: AttendanceStatus| events.iter().filter(|e| e.status == status).count();

    let participation: Vec<f64> = events.iter().map(|e| e.completion_percentage).collect();

    let mut weeks: BTreeMap<(i32, u32), (usize, usize)> = BTreeMap::new();
    for event in events {
        let iso = event.date.iso_week();
        let slot = weeks.entry((iso.year(), iso.week())).or_insert((0, 0));
        slot.0 += 1;
        if event.status != AttendanceStatus::Absent {
            slot.1 += 1;
        }
    }
    let weekly_trend = weeks
        .into_iter()
        .map(|((year, week), (sessions, attended))| WeeklyPresence {
            week: format!("{year}-W{week:02}"),
            sessions,
            presence_rate: attended as f64 * 100.0 / sessions as f64,
        })
        .collect();

    AttendanceReport {
        total_sessions: events.len(),
        present_count: count(AttendanceStatus::Present),
        absent_count: count(AttendanceStatus::Absent),
        late_count: count(AttendanceStatus::Late),
        average_participation: mean(&participation).unwrap_or(0.0),
        weekly_trend,
    }
}

// ---------------------------------------------------------------------------
// Logs
// ---------------------------------------------------------------------------

/// Append-only storage for attendance events.
pub trait AttendanceLog: Send + Sync {
    fn append(&self, event: &AttendanceEvent) -> Result<()>;

    /// All events in append order.
    fn events(&self) -> Result<Vec<AttendanceEvent>>;
}

#[derive(Default)]
pub struct InMemoryAttendanceLog {
    events: RwLock<Vec<AttendanceEvent>>,
}

impl InMemoryAttendanceLog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AttendanceLog for InMemoryAttendanceLog {
    fn append(&self, event: &AttendanceEvent) -> Result<()> {
        self.events
            .write()
            .map_err(|_| ReportError::Serialization("attendance log lock poisoned".into()))?
            .push(event.clone());
        Ok(())
    }

    fn events(&self) -> Result<Vec<AttendanceEvent>> {
        Ok(self
            .events
            .read()
            .map_err(|_| ReportError::Serialization("attendance log lock poisoned".into()))?
            .clone())
    }
}

/// One JSON object per line, appended to a file. Appends from one process
/// are serialized.
pub struct JsonLinesAttendanceLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonLinesAttendanceLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AttendanceLog for JsonLinesAttendanceLog {
    fn append(&self, event: &AttendanceEvent) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| ReportError::Serialization("attendance log lock poisoned".into()))?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let line = serde_json::to_string(event)?;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                ReportError::serialization(&format!("failed to open {}", self.path.display()), e)
            })?;
        writeln!(file, "{line}")?;
        Ok(())
    }

    fn events(&self) -> Result<Vec<AttendanceEvent>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        content
            .lines()
            .filter(|l| !l.trim().is_empty())
            .enumerate()
            .map(|(i, line)| {
                serde_json::from_str(line).map_err(|e| {
                    ReportError::serialization(
                        &format!("{} line {}", self.path.display(), i + 1),
                        e,
                    )
                })
            })
            .collect()
    }
}

/// Records attendance and builds attendance reports.
#[derive(Clone)]
pub struct AttendanceTracker {
    log: Arc<dyn AttendanceLog>,
}

impl AttendanceTracker {
    pub fn new(log: Arc<dyn AttendanceLog>) -> Self {
        Self { log }
    }

    /// Validate `input`, append it to the log, and return the stored event.
    pub fn track_attendance(&self, input: AttendanceInput) -> Result<AttendanceEvent> {
        if input.student_id.trim().is_empty() {
            return Err(ReportError::Validation("studentId is required".into()));
        }
        if !(0.0..=100.0).contains(&input.completion_percentage) {
            return Err(ReportError::Validation(format!(
                "completionPercentage must be between 0 and 100, got {}",
                input.completion_percentage
            )));
        }
        if input.time_spent < 0.0 {
            return Err(ReportError::Validation("timeSpent must not be negative".into()));
        }

        let event = AttendanceEvent {
            id: format!("attendance_{}", Uuid::new_v4().simple()),
            student_id: input.student_id,
            quiz_id: input.quiz_id,
            class_id: input.class_id,
            date: input.date.unwrap_or_else(Utc::now),
            status: input.status,
            participation_level: input.participation_level,
            time_spent: input.time_spent,
            questions_answered: input.questions_answered,
            completion_percentage: input.completion_percentage,
        };
        self.log.append(&event)?;
        tracing::info!(
            id = %event.id,
            student = %event.student_id,
            status = %event.status,
            "attendance tracked"
        );
        Ok(event)
    }

    /// Summarize the events matching `filters`.
    pub fn generate_attendance_report(&self, filters: &AttendanceFilters) -> Result<AttendanceReport> {
        let events: Vec<AttendanceEvent> = self
            .log
            .events()?
            .into_iter()
            .filter(|e| filters.matches(e))
            .collect();
        Ok(summarize_attendance(&events))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn input(student: &str, status: AttendanceStatus, day: u32, completion: f64) -> AttendanceInput {
        AttendanceInput {
            student_id: student.into(),
            quiz_id: "quiz-1".into(),
            class_id: "7B".into(),
            date: Some(Utc.with_ymd_and_hms(2025, 3, day, 9, 0, 0).unwrap()),
            status,
            participation_level: ParticipationLevel::Full,
            time_spent: 600.0,
            questions_answered: 10,
            completion_percentage: completion,
        }
    }

    fn tracker() -> AttendanceTracker {
        AttendanceTracker::new(Arc::new(InMemoryAttendanceLog::new()))
    }

    #[test]
    fn counts_and_average_participation() {
        let t = tracker();
        t.track_attendance(input("s1", AttendanceStatus::Present, 3, 100.0)).unwrap();
        t.track_attendance(input("s2", AttendanceStatus::Absent, 3, 0.0)).unwrap();
        t.track_attendance(input("s3", AttendanceStatus::Late, 4, 50.0)).unwrap();

        let report = t.generate_attendance_report(&AttendanceFilters::default()).unwrap();
        assert_eq!(report.total_sessions, 3);
        assert_eq!(report.present_count, 1);
        assert_eq!(report.absent_count, 1);
        assert_eq!(report.late_count, 1);
        assert!((report.average_participation - 50.0).abs() < 1e-9);
    }

    #[test]
    fn weekly_trend_is_ordered_by_iso_week() {
        let t = tracker();
        // 2025-03-10 is a Monday (W11); 2025-03-03 is W10.
        t.track_attendance(input("s1", AttendanceStatus::Absent, 10, 0.0)).unwrap();
        t.track_attendance(input("s1", AttendanceStatus::Present, 3, 100.0)).unwrap();
        t.track_attendance(input("s2", AttendanceStatus::Late, 4, 80.0)).unwrap();
        t.track_attendance(input("s2", AttendanceStatus::Present, 11, 90.0)).unwrap();

        let report = t.generate_attendance_report(&AttendanceFilters::default()).unwrap();
        assert_eq!(
            report.weekly_trend,
            vec![
                WeeklyPresence {
                    week: "2025-W10".into(),
                    sessions: 2,
                    presence_rate: 100.0
                },
                WeeklyPresence {
                    week: "2025-W11".into(),
                    sessions: 2,
                    presence_rate: 50.0
                },
            ]
        );
    }

    #[test]
    fn filters_narrow_events() {
        let t = tracker();
        t.track_attendance(input("s1", AttendanceStatus::Present, 3, 100.0)).unwrap();
        t.track_attendance(input("s2", AttendanceStatus::Absent, 3, 0.0)).unwrap();
        let filters = AttendanceFilters {
            student_ids: vec!["s2".into()],
            ..Default::default()
        };
        let report = t.generate_attendance_report(&filters).unwrap();
        assert_eq!(report.total_sessions, 1);
        assert_eq!(report.absent_count, 1);
    }

    #[test]
    fn empty_log_report() {
        let report = tracker()
            .generate_attendance_report(&AttendanceFilters::default())
            .unwrap();
        assert_eq!(report.total_sessions, 0);
        assert_eq!(report.average_participation, 0.0);
        assert!(report.weekly_trend.is_empty());
    }

    #[test]
    fn invalid_input_rejected() {
        let t = tracker();
        let err = t
            .track_attendance(input("s1", AttendanceStatus::Present, 3, 140.0))
            .unwrap_err();
        assert!(matches!(err, ReportError::Validation(_)));
        let err = t
            .track_attendance(input(" ", AttendanceStatus::Present, 3, 10.0))
            .unwrap_err();
        assert!(matches!(err, ReportError::Validation(_)));
    }

    #[test]
    fn json_lines_log_appends() {
        let dir = tempfile::tempdir().unwrap();
        let log = Arc::new(JsonLinesAttendanceLog::new(dir.path().join("nested/attendance.jsonl")));
        let t = AttendanceTracker::new(log.clone());
        let first = t.track_attendance(input("s1", AttendanceStatus::Present, 3, 100.0)).unwrap();
        t.track_attendance(input("s2", AttendanceStatus::Late, 4, 60.0)).unwrap();

        let events = log.events().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], first);
        assert!(events[0].id.starts_with("attendance_"));
    }

    #[test]
    fn iso_week_labels() {
        let ts = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(iso_week_label(ts), "2025-W01");
        let ts = Utc.with_ymd_and_hms(2024, 12, 30, 0, 0, 0).unwrap();
        assert_eq!(iso_week_label(ts), "2025-W01");
    }
}
