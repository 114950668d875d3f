//! Field projection, grouping, and stable sorting.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::fields;
use crate::model::{Record, SortOrder};
use crate::report::{GroupedRecord, ReportDetails};

/// Label used for records that lack the grouping key.
pub const UNKNOWN_GROUP: &str = "Unknown";

/// Keep only `selected` keys, in `selected` order. Missing keys are omitted.
pub fn project(records: &[Record], selected: &[String]) -> Vec<Record> {
    records
        .iter()
        .map(|record| {
            selected
                .iter()
                .filter_map(|key| record.get(key).map(|v| (key.clone(), v.clone())))
                .collect()
        })
        .collect()
}

/// Stable sort on `key`. Equal keys keep their input order in both
/// directions; records without the key always come last.
pub fn sort_records(records: &mut [Record], key: &str, order: SortOrder) {
    records.sort_by(|a, b| match (a.get(key), b.get(key)) {
        (Some(x), Some(y)) => match order {
            SortOrder::Asc => x.compare(y),
            SortOrder::Desc => y.compare(x),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

/// Partition records into buckets in first-seen key order.
pub fn partition<'a, I>(records: I, key: &str) -> Vec<(String, Vec<Record>)>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut buckets: Vec<(String, Vec<Record>)> = Vec::new();
    for record in records {
        let label = record
            .get(key)
            .map(|v| v.to_string())
            .unwrap_or_else(|| UNKNOWN_GROUP.to_string());
        let slot = *index.entry(label.clone()).or_insert_with(|| {
            buckets.push((label, Vec::new()));
            buckets.len() - 1
        });
        buckets[slot].1.push(record.clone());
    }
    buckets
}

/// Group records by `key` into [`GroupedRecord`] buckets.
///
/// A bucket's average score only counts members that carry a score.
pub fn group_records(records: &[Record], key: &str) -> Vec<GroupedRecord> {
    partition(records, key)
        .into_iter()
        .map(|(group, items)| {
            let scores: Vec<f64> = items.iter().filter_map(|r| r.number(fields::SCORE)).collect();
            let average_score = mean(&scores).unwrap_or(0.0);
            GroupedRecord {
                group,
                count: items.len(),
                items,
                average_score,
            }
        })
        .collect()
}

/// Project, optionally group, then sort.
///
/// When grouping, items inside each bucket are sorted and bucket order stays
/// first-seen.
pub fn shape(
    records: &[Record],
    selected: &[String],
    group_by: Option<&str>,
    sort_by: &str,
    order: SortOrder,
) -> ReportDetails {
    let projected = project(records, selected);
    shape_projected(projected, group_by, sort_by, order)
}

pub(crate) fn shape_projected(
    mut projected: Vec<Record>,
    group_by: Option<&str>,
    sort_by: &str,
    order: SortOrder,
) -> ReportDetails {
    match group_by {
        Some(key) => {
            let mut groups = group_records(&projected, key);
            for group in &mut groups {
                sort_records(&mut group.items, sort_by, order);
            }
            ReportDetails::Grouped(groups)
        }
        None => {
            sort_records(&mut projected, sort_by, order);
            ReportDetails::Flat(projected)
        }
    }
}

pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(name: &str, class: &str, score: Option<f64>, seq: u32) -> Record {
        let mut r = Record::new()
            .with("student_name", name)
            .with("class", class)
            .with("seq", seq);
        if let Some(s) = score {
            r.insert("score", s);
        }
        r
    }

    fn seqs(records: &[Record]) -> Vec<f64> {
        records.iter().map(|r| r.number("seq").unwrap()).collect()
    }

    #[test]
    fn projection_keeps_selected_order_and_skips_missing() {
        let records = vec![rec("Ada", "7B", None, 1)];
        let projected = project(&records, &["score".into(), "class".into(), "student_name".into()]);
        let keys: Vec<&str> = projected[0].keys().collect();
        assert_eq!(keys, vec!["class", "student_name"]);
    }

    #[test]
    fn sort_is_stable_ascending() {
        let mut records = vec![
            rec("Cy", "A", None, 1),
            rec("Ada", "A", None, 2),
            rec("Cy", "A", None, 3),
            rec("Ada", "A", None, 4),
        ];
        sort_records(&mut records, "student_name", SortOrder::Asc);
        assert_eq!(seqs(&records), vec![2.0, 4.0, 1.0, 3.0]);
    }

    #[test]
    fn sort_is_stable_descending() {
        let mut records = vec![
            rec("Ada", "A", None, 1),
            rec("Cy", "A", None, 2),
            rec("Ada", "A", None, 3),
            rec("Cy", "A", None, 4),
        ];
        sort_records(&mut records, "student_name", SortOrder::Desc);
        assert_eq!(seqs(&records), vec![2.0, 4.0, 1.0, 3.0]);
    }

    #[test]
    fn missing_sort_key_goes_last_both_ways() {
        let mut records = vec![
            Record::new().with("seq", 1u32),
            rec("Ben", "A", Some(50.0), 2),
            rec("Ada", "A", Some(90.0), 3),
        ];
        sort_records(&mut records, "score", SortOrder::Asc);
        assert_eq!(seqs(&records), vec![2.0, 3.0, 1.0]);
        sort_records(&mut records, "score", SortOrder::Desc);
        assert_eq!(seqs(&records), vec![3.0, 2.0, 1.0]);
    }

    #[test]
    fn numbers_sort_numerically() {
        let mut records = vec![
            rec("a", "A", Some(100.0), 1),
            rec("b", "A", Some(9.0), 2),
            rec("c", "A", Some(55.5), 3),
        ];
        sort_records(&mut records, "score", SortOrder::Asc);
        assert_eq!(seqs(&records), vec![2.0, 3.0, 1.0]);
    }

    #[test]
    fn grouping_first_seen_order_and_average() {
        let records = vec![
            rec("Ada", "7B", Some(80.0), 1),
            rec("Ben", "7A", Some(60.0), 2),
            rec("Cy", "7B", None, 3),
            rec("Di", "7B", Some(100.0), 4),
        ];
        let groups = group_records(&records, "class");
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].group, "7B");
        assert_eq!(groups[0].count, 3);
        // Cy has no score and is excluded, not zeroed.
        assert!((groups[0].average_score - 90.0).abs() < f64::EPSILON);
        assert_eq!(groups[1].group, "7A");
        assert_eq!(groups[1].count, 1);
    }

    #[test]
    fn records_without_group_key_land_in_unknown() {
        let records = vec![rec("Ada", "7B", None, 1), Record::new().with("seq", 2u32)];
        let groups = group_records(&records, "class");
        assert_eq!(groups[1].group, UNKNOWN_GROUP);
        assert_eq!(groups[1].average_score, 0.0);
    }

    #[test]
    fn shape_sorts_within_groups() {
        let records = vec![
            rec("Cy", "7B", Some(70.0), 1),
            rec("Ada", "7A", Some(60.0), 2),
            rec("Ada", "7B", Some(80.0), 3),
        ];
        let selected = vec!["student_name".into(), "class".into(), "score".into(), "seq".into()];
        let details = shape(&records, &selected, Some("class"), "student_name", SortOrder::Asc);
        let ReportDetails::Grouped(groups) = details else {
            panic!("expected grouped details");
        };
        assert_eq!(groups[0].group, "7B");
        assert_eq!(seqs(&groups[0].items), vec![3.0, 1.0]);
        assert_eq!(groups.iter().map(|g| g.count).sum::<usize>(), 3);
    }
}
