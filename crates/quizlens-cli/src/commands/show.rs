//! The `quizlens show` command.

use anyhow::Result;
use comfy_table::{Cell, Table};

use quizlens_core::fields::FieldRegistry;
use quizlens_core::model::Record;
use quizlens_core::report::ReportDetails;
use quizlens_export::json_writer::{generate_json, ExportedReport};

use super::{summary_table, Context};

pub async fn execute(ctx: &Context, id: String, json: bool) -> Result<()> {
    let engine = ctx.engine()?;
    let (definition, data) = engine.regenerate(&id).await?;

    if json {
        let exported = ExportedReport {
            report: definition,
            data,
        };
        println!("{}", generate_json(&exported)?);
        return Ok(());
    }

    println!("{} ({})", definition.title, definition.id);
    if !definition.description.is_empty() {
        println!("{}", definition.description);
    }
    println!("\n{}", summary_table(&data.summary));

    let registry = &engine.config().fields;
    match &data.details {
        ReportDetails::Flat(records) => {
            println!("{}", details_table(registry, &definition.selected_fields, records));
        }
        ReportDetails::Grouped(groups) => {
            for group in groups {
                println!(
                    "\n{}: {} record(s), average score {:.1}",
                    group.group, group.count, group.average_score
                );
                println!(
                    "{}",
                    details_table(registry, &definition.selected_fields, &group.items)
                );
            }
        }
    }

    for chart in &data.charts {
        println!("\n{}", chart.title);
        for (label, value) in chart.labels.iter().zip(&chart.data) {
            println!("  {label}: {value:.1}");
        }
    }
    Ok(())
}

fn details_table(registry: &FieldRegistry, selected: &[String], records: &[Record]) -> Table {
    let mut table = Table::new();
    table.set_header(selected.iter().map(|k| registry.label_or_key(k)));
    for record in records {
        table.add_row(selected.iter().map(|k| {
            Cell::new(record.get(k).map(|v| v.to_string()).unwrap_or_default())
        }));
    }
    table
}
