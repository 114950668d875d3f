//! The `quizlens time` command.

use anyhow::Result;
use comfy_table::{Cell, Table};

use quizlens_core::time_analytics::TimeBreakdown;

use super::{parse_range, report_filters, Context};
use crate::FilterArgs;

pub async fn execute(ctx: &Context, filters: FilterArgs, json: bool) -> Result<()> {
    let engine = ctx.engine()?;
    let range = parse_range(
        filters.from.as_deref(),
        filters.to.as_deref(),
        engine.config().default_window_days,
    )?;
    let analytics = engine
        .generate_time_analytics(&report_filters(&filters), range)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&analytics)?);
        return Ok(());
    }

    let o = &analytics.overview;
    println!("Total time:        {:.0}s", o.total_time_spent);
    println!("Average session:   {:.1}s", o.average_session_time);
    println!("Longest / shortest: {:.0}s / {:.0}s", o.longest_session, o.shortest_session);
    match o.most_active_hour {
        Some(hour) => println!("Most active hour:  {hour:02}:00"),
        None => println!("Most active hour:  n/a"),
    }

    print_breakdown("Subject", &analytics.by_subject);
    print_breakdown("Difficulty", &analytics.by_difficulty);

    for tip in &analytics.recommendations {
        println!("Tip: {tip}");
    }
    Ok(())
}

fn print_breakdown(label: &str, rows: &[TimeBreakdown]) {
    if rows.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![label, "Sessions", "Total", "Average"]);
    for row in rows {
        table.add_row(vec![
            Cell::new(&row.label),
            Cell::new(row.sessions),
            Cell::new(format!("{:.0}s", row.total_time)),
            Cell::new(format!("{:.1}s", row.average_time)),
        ]);
    }
    println!("\n{table}");
}
