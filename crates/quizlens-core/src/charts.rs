//! Chart payload builders.

use crate::fields;
use crate::model::{ChartSpec, Record};
use crate::report::{ChartData, ChartKind};
use crate::transform::{mean, partition};

/// Build one chart per recognized spec.
///
/// Unknown chart types, and known types missing their axis or field, are
/// skipped rather than failing the report.
pub fn build_charts(records: &[Record], specs: &[ChartSpec]) -> Vec<ChartData> {
    specs
        .iter()
        .filter_map(|spec| {
            let chart = build_chart(records, spec);
            if chart.is_none() {
                tracing::warn!(
                    chart_type = %spec.chart_type,
                    title = %spec.title,
                    "skipping unrecognized or incomplete chart spec"
                );
            }
            chart
        })
        .collect()
}

/// Build a single chart, or `None` if the chart spec cannot be rendered.
pub fn build_chart(records: &[Record], spec: &ChartSpec) -> Option<ChartData> {
    match spec.chart_type.to_lowercase().as_str() {
        "bar" => {
            let x = spec.x_axis.as_deref()?;
            let y = spec.y_axis.as_deref()?;
            Some(bar_chart(records, &spec.title, x, y))
        }
        "line" => {
            let y = spec.y_axis.as_deref()?;
            Some(line_chart(records, &spec.title, y))
        }
        "pie" => {
            let field = spec.field.as_deref()?;
            Some(pie_chart(records, &spec.title, field))
        }
        _ => None,
    }
}

/// Mean of `y` per distinct `x`, labels in first-seen order.
pub fn bar_chart(records: &[Record], title: &str, x: &str, y: &str) -> ChartData {
    let (labels, data) = partition(records.iter().filter(|r| r.get(x).is_some()), x)
        .into_iter()
        .map(|(label, items)| {
            let values: Vec<f64> = items.iter().filter_map(|r| r.number(y)).collect();
            (label, mean(&values).unwrap_or(0.0))
        })
        .unzip();
    ChartData {
        kind: ChartKind::Bar,
        title: title.to_string(),
        labels,
        data,
    }
}

/// `y` per record in ascending date order, labelled `MM/DD/YYYY`.
pub fn line_chart(records: &[Record], title: &str, y: &str) -> ChartData {
    let mut dated: Vec<(chrono::DateTime<chrono::Utc>, &Record)> = records
        .iter()
        .filter_map(|r| r.timestamp().map(|ts| (ts, r)))
        .collect();
    dated.sort_by_key(|(ts, _)| *ts);

    let (labels, data) = dated
        .into_iter()
        .map(|(ts, r)| (ts.format("%m/%d/%Y").to_string(), r.number(y).unwrap_or(0.0)))
        .unzip();
    ChartData {
        kind: ChartKind::Line,
        title: title.to_string(),
        labels,
        data,
    }
}

/// Count of records per distinct `field` value, first-seen order.
pub fn pie_chart(records: &[Record], title: &str, field: &str) -> ChartData {
    let (labels, data) = partition(records.iter().filter(|r| r.get(field).is_some()), field)
        .into_iter()
        .map(|(label, items)| (label, items.len() as f64))
        .unzip();
    ChartData {
        kind: ChartKind::Pie,
        title: title.to_string(),
        labels,
        data,
    }
}

/// Charts a dashboard shows when the caller asks for none.
pub fn default_chart_specs() -> Vec<ChartSpec> {
    vec![
        ChartSpec::bar("Average Score by Subject", fields::SUBJECT, fields::SCORE),
        ChartSpec::line("Score Trend", fields::SCORE),
        ChartSpec::pie("Difficulty Mix", fields::DIFFICULTY),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(subject: &str, difficulty: &str, score: f64, date: &str) -> Record {
        Record::new()
            .with("subject", subject)
            .with("difficulty", difficulty)
            .with("score", score)
            .with("date", date)
    }

    #[test]
    fn pie_counts_per_value() {
        let records = vec![
            rec("Math", "Easy", 1.0, "2025-03-01"),
            rec("Math", "Easy", 1.0, "2025-03-02"),
            rec("Math", "Hard", 1.0, "2025-03-03"),
        ];
        let chart = build_chart(&records, &ChartSpec::pie("Mix", "difficulty")).unwrap();
        assert_eq!(chart.kind, ChartKind::Pie);
        assert_eq!(chart.labels, vec!["Easy", "Hard"]);
        assert_eq!(chart.data, vec![2.0, 1.0]);
    }

    #[test]
    fn bar_means_per_group_first_seen() {
        let records = vec![
            rec("History", "Easy", 60.0, "2025-03-01"),
            rec("Math", "Easy", 90.0, "2025-03-01"),
            rec("History", "Easy", 80.0, "2025-03-01"),
        ];
        let chart = bar_chart(&records, "Avg", "subject", "score");
        assert_eq!(chart.labels, vec!["History", "Math"]);
        assert_eq!(chart.data, vec![70.0, 90.0]);
    }

    #[test]
    fn line_sorts_by_date() {
        let records = vec![
            rec("Math", "Easy", 3.0, "2025-03-09T10:00:00Z"),
            rec("Math", "Easy", 1.0, "2025-03-01T10:00:00Z"),
            rec("Math", "Easy", 2.0, "2025-03-05T10:00:00Z"),
        ];
        let chart = line_chart(&records, "Trend", "score");
        assert_eq!(chart.labels, vec!["03/01/2025", "03/05/2025", "03/09/2025"]);
        assert_eq!(chart.data, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn unknown_and_incomplete_specs_are_skipped() {
        let records = vec![rec("Math", "Easy", 1.0, "2025-03-01")];
        let specs = vec![
            ChartSpec {
                chart_type: "radar".into(),
                title: "Radar".into(),
                x_axis: None,
                y_axis: None,
                field: None,
            },
            ChartSpec {
                chart_type: "pie".into(),
                title: "No field".into(),
                x_axis: None,
                y_axis: None,
                field: None,
            },
            ChartSpec::pie("Mix", "difficulty"),
        ];
        let charts = build_charts(&records, &specs);
        assert_eq!(charts.len(), 1);
        assert_eq!(charts[0].title, "Mix");
    }

    #[test]
    fn default_specs_all_render() {
        let records = vec![rec("Math", "Easy", 75.0, "2025-03-01")];
        assert_eq!(build_charts(&records, &default_chart_specs()).len(), 3);
    }
}
