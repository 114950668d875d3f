//! Headline statistics over a flat record set.
//!
//! The empty-set values are fixed: average 0, highest 0, lowest 100,
//! average time 0, completion rate 0.

use crate::fields;
use crate::model::Record;
use crate::report::SummaryStats;
use crate::transform::mean;

/// Records whose completion rate exceeds this count as completed.
pub const COMPLETION_THRESHOLD: f64 = 80.0;

/// Compute [`SummaryStats`] for `records`.
pub fn compute_summary(records: &[Record]) -> SummaryStats {
    let total_records = records.len();
    let scores: Vec<f64> = records.iter().filter_map(|r| r.number(fields::SCORE)).collect();

    let positive_scores: Vec<f64> = scores.iter().copied().filter(|s| *s > 0.0).collect();
    let average_score = mean(&positive_scores).unwrap_or(0.0);

    let highest_score = scores.iter().copied().fold(0.0_f64, f64::max);
    let lowest_score = scores.iter().copied().fold(100.0_f64, f64::min);

    let times: Vec<f64> = records
        .iter()
        .filter_map(|r| r.number(fields::TIME_TAKEN))
        .filter(|t| *t > 0.0)
        .collect();
    let average_time = mean(&times).map(f64::round).unwrap_or(0.0);

    let completed = records
        .iter()
        .filter(|r| {
            r.number(fields::COMPLETION_RATE)
                .is_some_and(|c| c > COMPLETION_THRESHOLD)
        })
        .count();
    let completion_rate = if total_records == 0 {
        0.0
    } else {
        completed as f64 * 100.0 / total_records as f64
    };

    SummaryStats {
        total_records,
        average_score,
        highest_score,
        lowest_score,
        average_time,
        completion_rate,
    }
}
