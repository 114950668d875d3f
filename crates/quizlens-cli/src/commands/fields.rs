//! The `quizlens fields` command.

use anyhow::Result;

use super::Context;

pub fn execute(ctx: &Context) -> Result<()> {
    let config = ctx.config()?;
    let mut table = comfy_table::Table::new();
    table.set_header(vec!["Key", "Label"]);
    for field in config.fields.fields() {
        table.add_row(vec![field.key.as_str(), field.label.as_str()]);
    }
    println!("{table}");
    Ok(())
}
