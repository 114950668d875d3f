//! The `quizlens attendance` commands.

use anyhow::{anyhow, Result};
use comfy_table::{Cell, Table};

use quizlens_core::attendance::{AttendanceFilters, AttendanceInput};

use super::{parse_bound, parse_range, Context};
use crate::AttendanceCommand;

pub fn execute(ctx: &Context, command: AttendanceCommand) -> Result<()> {
    let engine = ctx.engine()?;

    match command {
        AttendanceCommand::Track {
            student,
            quiz,
            class,
            status,
            participation,
            time_spent,
            questions,
            completion,
            date,
        } => {
            let input = AttendanceInput {
                student_id: student,
                quiz_id: quiz,
                class_id: class,
                date: date.as_deref().map(|d| parse_bound(d, false)).transpose()?,
                status: status.parse().map_err(|e: String| anyhow!(e))?,
                participation_level: participation.parse().map_err(|e: String| anyhow!(e))?,
                time_spent,
                questions_answered: questions,
                completion_percentage: completion,
            };
            let event = engine.track_attendance(input)?;
            println!(
                "Tracked {} for {} on {} ({})",
                event.status,
                event.student_id,
                event.date.format("%Y-%m-%d"),
                event.id
            );
        }
        AttendanceCommand::Report {
            students,
            classes,
            quizzes,
            from,
            to,
            json,
        } => {
            let filters = AttendanceFilters {
                student_ids: students,
                class_ids: classes,
                quiz_ids: quizzes,
                date_range: parse_range(
                    from.as_deref(),
                    to.as_deref(),
                    engine.config().default_window_days,
                )?,
            };
            let report = engine.generate_attendance_report(&filters)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }

            let mut totals = Table::new();
            totals.set_header(vec!["Sessions", "Present", "Late", "Absent", "Avg Participation"]);
            totals.add_row(vec![
                Cell::new(report.total_sessions),
                Cell::new(report.present_count),
                Cell::new(report.late_count),
                Cell::new(report.absent_count),
                Cell::new(format!("{:.1}%", report.average_participation)),
            ]);
            println!("{totals}");

            if !report.weekly_trend.is_empty() {
                let mut weekly = Table::new();
                weekly.set_header(vec!["Week", "Sessions", "Presence"]);
                for week in &report.weekly_trend {
                    weekly.add_row(vec![
                        Cell::new(&week.week),
                        Cell::new(week.sessions),
                        Cell::new(format!("{:.1}%", week.presence_rate)),
                    ]);
                }
                println!("{weekly}");
            }
        }
    }
    Ok(())
}
