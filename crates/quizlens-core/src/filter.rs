//! Filter and date-range predicates over record sets.
//!
//! A record matches when it satisfies every non-empty filter category and
//! its `date` lies inside the range (inclusive on both ends). Within a
//! category any listed value matches.

use crate::fields;
use crate::model::{DateRange, Record, ReportFilters};

/// Returns `true` if `record` passes all filters and the date range.
pub fn matches(record: &Record, filters: &ReportFilters, range: &DateRange) -> bool {
    let in_range = record.timestamp().is_some_and(|ts| range.contains(ts));
    in_range
        && (any_of(record, fields::STUDENT_NAME, &filters.students)
            || any_of(record, fields::STUDENT_ID, &filters.students))
        && any_of(record, fields::CLASS, &filters.classes)
        && any_of(record, fields::SUBJECT, &filters.subjects)
        && any_of(record, fields::QUIZ_TYPE, &filters.quiz_types)
        && any_of(record, fields::DIFFICULTY, &filters.difficulty_levels)
}

/// Keep only matching records, preserving input order.
pub fn apply(records: &[Record], filters: &ReportFilters, range: &DateRange) -> Vec<Record> {
    records
        .iter()
        .filter(|r| matches(r, filters, range))
        .cloned()
        .collect()
}

fn any_of(record: &Record, key: &str, allowed: &[String]) -> bool {
    if allowed.is_empty() {
        return true;
    }
    match record.get(key) {
        Some(value) => {
            let rendered = value.to_string();
            allowed.iter().any(|a| *a == rendered)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn range() -> DateRange {
        DateRange {
            start: Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2025, 3, 31, 23, 59, 59).unwrap(),
        }
    }

    fn attempt(student: &str, subject: &str, date: &str) -> Record {
        Record::new()
            .with("student_name", student)
            .with("student_id", format!("id-{student}"))
            .with("subject", subject)
            .with("class", "7B")
            .with("date", date)
    }

    #[test]
    fn empty_filters_only_check_dates() {
        let records = vec![
            attempt("Ada", "Mathematics", "2025-03-02T09:00:00Z"),
            attempt("Ben", "History", "2025-04-02T09:00:00Z"),
            attempt("Cy", "History", "not a date"),
        ];
        let kept = apply(&records, &ReportFilters::default(), &range());
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].text("student_name"), Some("Ada"));
    }

    #[test]
    fn categories_are_anded_values_are_ored() {
        let records = vec![
            attempt("Ada", "Mathematics", "2025-03-02T09:00:00Z"),
            attempt("Ben", "Physics", "2025-03-03T09:00:00Z"),
            attempt("Cy", "History", "2025-03-04T09:00:00Z"),
        ];
        let filters = ReportFilters {
            subjects: vec!["Mathematics".into(), "Physics".into()],
            students: vec!["Ben".into(), "Cy".into()],
            ..Default::default()
        };
        let kept = apply(&records, &filters, &range());
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].text("student_name"), Some("Ben"));
    }

    #[test]
    fn students_match_by_name_or_id() {
        let record = attempt("Ada", "Mathematics", "2025-03-02T09:00:00Z");
        let by_id = ReportFilters {
            students: vec!["id-Ada".into()],
            ..Default::default()
        };
        assert!(matches(&record, &by_id, &range()));
    }

    #[test]
    fn missing_field_fails_constrained_category() {
        let record = Record::new().with("date", "2025-03-02");
        let filters = ReportFilters {
            difficulty_levels: vec!["Hard".into()],
            ..Default::default()
        };
        assert!(!matches(&record, &filters, &range()));
        assert!(matches(&record, &ReportFilters::default(), &range()));
    }

    #[test]
    fn range_is_inclusive() {
        let point = Utc.with_ymd_and_hms(2025, 3, 10, 8, 0, 0).unwrap();
        let exact = DateRange {
            start: point,
            end: point,
        };
        let at = Record::new().with("date", "2025-03-10T08:00:00Z");
        let after = Record::new().with("date", "2025-03-10T08:00:01Z");
        assert!(matches(&at, &ReportFilters::default(), &exact));
        assert!(!matches(&after, &ReportFilters::default(), &exact));
    }
}
