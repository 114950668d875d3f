//! End-to-end pipeline tests against the fixture source.
//!
//! These exercise the engine the way an embedding application would:
//! fixture records in, report definitions persisted, results shaped.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};

use quizlens_core::attendance::{
    AttendanceFilters, AttendanceInput, AttendanceStatus, ParticipationLevel,
};
use quizlens_core::config::ReportingConfig;
use quizlens_core::engine::{FixedClock, ReportingEngine};
use quizlens_core::error::ReportError;
use quizlens_core::model::{ChartSpec, DateRange, Record, ReportConfig, ReportFilters};
use quizlens_core::report::{ChartKind, ReportDetails};
use quizlens_core::source::{FailingSource, FixtureSource};
use quizlens_core::store::{InMemoryReportStore, ReportStore};

const SUBJECTS: [&str; 5] = ["Mathematics", "Physics", "History", "Biology", "Literature"];
const DIFFICULTIES: [&str; 3] = ["Easy", "Medium", "Hard"];

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap()
}

fn march() -> DateRange {
    DateRange::new(base_time(), Utc.with_ymd_and_hms(2025, 3, 31, 23, 59, 59).unwrap()).unwrap()
}

/// 100 records spread across 5 subjects, 2 classes and 25 days of March.
fn synthetic_records() -> Vec<Record> {
    (0..100u32)
        .map(|i| {
            let date = base_time() + Duration::hours(i as i64 * 6);
            Record::new()
                .with("student_name", format!("Student {:02}", i % 20))
                .with("student_id", format!("s{:02}", i % 20))
                .with("class", if i % 2 == 0 { "7A" } else { "7B" })
                .with("subject", SUBJECTS[(i % 5) as usize])
                .with("quiz_title", format!("Quiz {}", i % 7))
                .with("quiz_type", "practice")
                .with("difficulty", DIFFICULTIES[(i % 3) as usize])
                .with("score", 40.0 + (i % 60) as f64)
                .with("time_taken", 120.0 + (i % 10) as f64 * 30.0)
                .with("completion_rate", 50.0 + (i % 50) as f64)
                .with("attempts", 1 + i % 3)
                .with("date", date.to_rfc3339())
        })
        .collect()
}

fn engine_over(records: Vec<Record>) -> (Arc<InMemoryReportStore>, ReportingEngine) {
    let store = Arc::new(InMemoryReportStore::new());
    let engine = ReportingEngine::new(
        Arc::new(FixtureSource::new(records)),
        store.clone(),
        ReportingConfig::default(),
    )
    .with_clock(Arc::new(FixedClock(
        Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap(),
    )));
    (store, engine)
}

#[tokio::test]
async fn subject_filter_keeps_only_matching_records() {
    let (_store, engine) = engine_over(synthetic_records());
    let mut config = ReportConfig::new("Mathematics only");
    config.date_range = Some(march());
    config.filters = ReportFilters {
        subjects: vec!["Mathematics".into()],
        ..Default::default()
    };

    let created = engine.create_custom_report(config).await.unwrap();
    let rows = created.data.details.rows();
    assert_eq!(rows.len(), 20);
    assert!(rows.iter().all(|r| r.text("subject") == Some("Mathematics")));
    assert_eq!(created.data.summary.total_records, 20);
    assert_eq!(created.data.metadata.total_records, 20);
}

#[tokio::test]
async fn point_range_without_exact_match_is_empty() {
    let (_store, engine) = engine_over(synthetic_records());
    let t = base_time() + Duration::minutes(1);
    let mut config = ReportConfig::new("Instant");
    config.date_range = Some(DateRange::new(t, t).unwrap());

    let created = engine.create_custom_report(config).await.unwrap();
    assert_eq!(created.data.details, ReportDetails::Flat(vec![]));
    assert_eq!(created.data.summary.total_records, 0);
}

#[tokio::test]
async fn group_by_class_splits_six_and_four() {
    let records: Vec<Record> = synthetic_records()
        .into_iter()
        .take(10)
        .enumerate()
        .map(|(i, mut r)| {
            r.insert("class", if i < 6 { "7A" } else { "7B" });
            r
        })
        .collect();
    let (_store, engine) = engine_over(records);
    let mut config = ReportConfig::new("By class");
    config.date_range = Some(march());
    config.group_by = Some("class".into());

    let created = engine.create_custom_report(config).await.unwrap();
    let ReportDetails::Grouped(groups) = &created.data.details else {
        panic!("expected grouped details");
    };
    assert_eq!(groups.len(), 2);
    assert_eq!((groups[0].group.as_str(), groups[0].count), ("7A", 6));
    assert_eq!((groups[1].group.as_str(), groups[1].count), ("7B", 4));
    assert_eq!(
        groups.iter().map(|g| g.count).sum::<usize>(),
        created.data.summary.total_records
    );
}

#[tokio::test]
async fn empty_source_yields_sentinels() {
    let (_store, engine) = engine_over(vec![]);
    let created = engine
        .create_custom_report(ReportConfig::new("Nothing"))
        .await
        .unwrap();
    let s = &created.data.summary;
    assert_eq!(s.total_records, 0);
    assert_eq!(s.average_score, 0.0);
    assert_eq!(s.highest_score, 0.0);
    assert_eq!(s.lowest_score, 100.0);
    assert_eq!(s.average_time, 0.0);
    assert_eq!(s.completion_rate, 0.0);
    assert_eq!(created.data.details.record_count(), 0);
}

#[tokio::test]
async fn high_and_low_bound_every_score() {
    let (_store, engine) = engine_over(synthetic_records());
    let mut config = ReportConfig::new("Bounds");
    config.date_range = Some(march());
    let created = engine.create_custom_report(config).await.unwrap();

    let s = &created.data.summary;
    for row in created.data.details.rows() {
        let score = row.number("score").unwrap();
        assert!(s.highest_score >= score);
        assert!(s.lowest_score <= score);
    }
}

#[tokio::test]
async fn definition_is_persisted_and_regenerates() {
    let (store, engine) = engine_over(synthetic_records());
    let mut config = ReportConfig::new("Persisted");
    config.date_range = Some(march());
    config.selected_fields = Some(vec!["student_name".into(), "score".into()]);
    config.sort_by = Some("score".into());
    config.sort_order = Some("desc".into());

    let created = engine.create_custom_report(config).await.unwrap();
    let id = created.report.id.clone();
    assert!(id.starts_with("report_"));
    assert_eq!(store.load(&id).unwrap(), Some(created.report.clone()));
    assert_eq!(engine.list_definitions().unwrap().len(), 1);

    let (definition, data) = engine.regenerate(&id).await.unwrap();
    assert_eq!(definition, created.report);
    assert_eq!(data, created.data);

    let first = data.details.rows()[0].clone();
    assert_eq!(first.keys().collect::<Vec<_>>(), vec!["student_name", "score"]);
    assert_eq!(first.number("score"), Some(99.0));
}

#[tokio::test]
async fn charts_skip_unknown_types_and_respect_include_flag() {
    let (_store, engine) = engine_over(synthetic_records());
    let mut spec = ChartSpec::pie("Difficulty", "difficulty");
    spec.chart_type = "radar".into();
    let mut config = ReportConfig::new("Charts");
    config.date_range = Some(march());
    config.chart_configs = vec![ChartSpec::pie("Difficulty", "difficulty"), spec];
    // Projection must not starve the charts.
    config.selected_fields = Some(vec!["student_name".into()]);

    let created = engine.create_custom_report(config.clone()).await.unwrap();
    assert_eq!(created.data.charts.len(), 1);
    assert_eq!(created.data.charts[0].kind, ChartKind::Pie);
    assert_eq!(created.data.charts[0].data.iter().sum::<f64>(), 100.0);

    config.include_charts = Some(false);
    let created = engine.create_custom_report(config).await.unwrap();
    assert!(created.data.charts.is_empty());
}

#[tokio::test]
async fn invalid_configs_fail_before_anything_is_stored() {
    let (store, engine) = engine_over(synthetic_records());

    let mut bad_group = ReportConfig::new("Bad group");
    bad_group.group_by = Some("shoe_size".into());
    let mut bad_format = ReportConfig::new("Bad format");
    bad_format.format = Some("docx".into());
    let mut unselected_group = ReportConfig::new("Scores by class");
    unselected_group.selected_fields = Some(vec!["student_name".into(), "score".into()]);
    unselected_group.group_by = Some("class".into());

    for config in [
        ReportConfig::new("   "),
        bad_group,
        bad_format,
        unselected_group,
    ] {
        let err = engine.create_custom_report(config).await.unwrap_err();
        assert!(matches!(err, ReportError::Validation(_)), "got {err:?}");
    }
    assert!(store.list().unwrap().is_empty());
}

#[tokio::test]
async fn source_failure_propagates_and_nothing_is_stored() {
    let store = Arc::new(InMemoryReportStore::new());
    let engine = ReportingEngine::new(
        Arc::new(FailingSource::new("database unreachable")),
        store.clone(),
        ReportingConfig::default(),
    );
    let err = engine
        .create_custom_report(ReportConfig::new("Doomed"))
        .await
        .unwrap_err();
    assert!(matches!(err, ReportError::DataSource(_)));
    assert!(err.to_string().contains("database unreachable"));
    assert!(store.list().unwrap().is_empty());
}

#[tokio::test]
async fn unknown_id_is_not_found() {
    let (_store, engine) = engine_over(vec![]);
    let err = engine.regenerate("report_missing").await.unwrap_err();
    assert!(matches!(err, ReportError::NotFound(id) if id == "report_missing"));
}

#[tokio::test]
async fn time_analytics_uses_filters() {
    let (_store, engine) = engine_over(synthetic_records());
    let filters = ReportFilters {
        subjects: vec!["Physics".into()],
        ..Default::default()
    };
    let analytics = engine
        .generate_time_analytics(&filters, Some(march()))
        .await
        .unwrap();
    assert_eq!(analytics.by_subject.len(), 1);
    assert_eq!(analytics.by_subject[0].label, "Physics");
    assert_eq!(analytics.by_subject[0].sessions, 20);
}

#[test]
fn attendance_round_trips_through_engine() {
    let (_store, engine) = engine_over(vec![]);
    for (student, status) in [
        ("s01", AttendanceStatus::Present),
        ("s02", AttendanceStatus::Late),
        ("s03", AttendanceStatus::Absent),
    ] {
        engine
            .track_attendance(AttendanceInput {
                student_id: student.into(),
                quiz_id: "quiz-1".into(),
                class_id: "7A".into(),
                date: Some(base_time()),
                status,
                participation_level: ParticipationLevel::Full,
                time_spent: 300.0,
                questions_answered: 10,
                completion_percentage: 90.0,
            })
            .unwrap();
    }
    let report = engine
        .generate_attendance_report(&AttendanceFilters::default())
        .unwrap();
    assert_eq!(report.total_sessions, 3);
    assert_eq!(report.present_count, 1);
    assert_eq!(report.late_count, 1);
    assert_eq!(report.absent_count, 1);
}
