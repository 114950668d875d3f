//! The `quizlens list` command.

use anyhow::Result;
use comfy_table::{Cell, Table};

use super::Context;

pub fn execute(ctx: &Context) -> Result<()> {
    let engine = ctx.engine()?;
    let definitions = engine.list_definitions()?;

    if definitions.is_empty() {
        println!("No reports stored yet. Run `quizlens create --title ...` to create one.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Id", "Title", "Type", "Format", "Created", "By"]);
    for d in &definitions {
        table.add_row(vec![
            Cell::new(&d.id),
            Cell::new(&d.title),
            Cell::new(d.report_type),
            Cell::new(d.format),
            Cell::new(d.created_at.format("%Y-%m-%d %H:%M")),
            Cell::new(&d.created_by),
        ]);
    }
    println!("{table}");
    println!("{} report(s)", definitions.len());
    Ok(())
}
