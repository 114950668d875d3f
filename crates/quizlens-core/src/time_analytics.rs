//! Time-on-task analytics over quiz sessions.

use std::collections::BTreeMap;

use chrono::Timelike;
use serde::{Deserialize, Serialize};

use crate::attendance::iso_week_label;
use crate::fields;
use crate::model::Record;
use crate::transform::{mean, partition};

/// Sessions longer than this multiple of the mean count as long.
pub const LONG_SESSION_FACTOR: f64 = 1.5;
/// Share of long sessions above which shorter sessions are recommended.
pub const LONG_SESSION_SHARE: f64 = 0.3;

pub const SHORTEN_SESSIONS: &str =
    "Many sessions run well past the average length; consider shorter, more focused quiz sessions.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeOverview {
    pub total_time_spent: f64,
    pub average_session_time: f64,
    /// Hour of day (0-23) with the most sessions; ties go to the earliest hour.
    pub most_active_hour: Option<u32>,
    pub longest_session: f64,
    pub shortest_session: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeBreakdown {
    pub label: String,
    pub total_time: f64,
    pub sessions: usize,
    pub average_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodTotal {
    pub period: String,
    pub total_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeAnalytics {
    pub overview: TimeOverview,
    pub by_subject: Vec<TimeBreakdown>,
    pub by_difficulty: Vec<TimeBreakdown>,
    pub daily: Vec<PeriodTotal>,
    pub weekly: Vec<PeriodTotal>,
    pub recommendations: Vec<String>,
}

/// Compute time analytics over the records that carry a numeric `time_taken`.
pub fn analyze_time(records: &[Record]) -> TimeAnalytics {
    let sessions: Vec<&Record> = records
        .iter()
        .filter(|r| r.number(fields::TIME_TAKEN).is_some())
        .collect();
    let durations: Vec<f64> = sessions
        .iter()
        .filter_map(|r| r.number(fields::TIME_TAKEN))
        .collect();

    let average = mean(&durations).unwrap_or(0.0);
    let overview = TimeOverview {
        total_time_spent: durations.iter().sum(),
        average_session_time: average,
        most_active_hour: most_active_hour(&sessions),
        longest_session: durations.iter().copied().reduce(f64::max).unwrap_or(0.0),
        shortest_session: durations.iter().copied().reduce(f64::min).unwrap_or(0.0),
    };

    let mut daily: BTreeMap<String, f64> = BTreeMap::new();
    let mut weekly: BTreeMap<String, f64> = BTreeMap::new();
    for record in &sessions {
        let (Some(ts), Some(t)) = (record.timestamp(), record.number(fields::TIME_TAKEN)) else {
            continue;
        };
        *daily.entry(ts.format("%Y-%m-%d").to_string()).or_default() += t;
        *weekly.entry(iso_week_label(ts)).or_default() += t;
    }

    TimeAnalytics {
        overview,
        by_subject: breakdown(&sessions, fields::SUBJECT),
        by_difficulty: breakdown(&sessions, fields::DIFFICULTY),
        daily: into_periods(daily),
        weekly: into_periods(weekly),
        recommendations: recommendations(&durations, average),
    }
}

fn most_active_hour(sessions: &[&Record]) -> Option<u32> {
    let mut per_hour = [0usize; 24];
    let mut any = false;
    for ts in sessions.iter().filter_map(|r| r.timestamp()) {
        per_hour[ts.hour() as usize] += 1;
        any = true;
    }
    if !any {
        return None;
    }
    let mut best = 0usize;
    for hour in 1..24 {
        if per_hour[hour] > per_hour[best] {
            best = hour;
        }
    }
    Some(best as u32)
}

fn breakdown(sessions: &[&Record], key: &str) -> Vec<TimeBreakdown> {
    partition(sessions.iter().copied(), key)
        .into_iter()
        .map(|(label, items)| {
            let times: Vec<f64> = items
                .iter()
                .filter_map(|r| r.number(fields::TIME_TAKEN))
                .collect();
            TimeBreakdown {
                label,
                total_time: times.iter().sum(),
                sessions: times.len(),
                average_time: mean(&times).unwrap_or(0.0),
            }
        })
        .collect()
}

fn into_periods(totals: BTreeMap<String, f64>) -> Vec<PeriodTotal> {
    totals
        .into_iter()
        .map(|(period, total_time)| PeriodTotal { period, total_time })
        .collect()
}

fn recommendations(durations: &[f64], average: f64) -> Vec<String> {
    let mut out = Vec::new();
    if durations.is_empty() {
        return out;
    }
    let long = durations
        .iter()
        .filter(|d| **d > average * LONG_SESSION_FACTOR)
        .count();
    if long as f64 / durations.len() as f64 > LONG_SESSION_SHARE {
        out.push(SHORTEN_SESSIONS.to_string());
    }
    out
}
