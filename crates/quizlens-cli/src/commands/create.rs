//! The `quizlens create` command.

use std::path::Path;

use anyhow::{Context as _, Result};

use quizlens_core::charts::default_chart_specs;
use quizlens_core::model::ReportConfig;

use super::{parse_range, report_filters, summary_table, Context};
use crate::CreateArgs;

pub async fn execute(ctx: &Context, args: CreateArgs) -> Result<()> {
    let engine = ctx.engine()?;
    let config = build_config(args.from_file.as_deref(), &args, engine.config().default_window_days)?;

    let created = engine.create_custom_report(config).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&created)?);
        return Ok(());
    }

    println!("{}", created.message);
    println!("Id: {}", created.report.id);
    println!(
        "Range: {} .. {}",
        created.report.date_range.start.format("%Y-%m-%d %H:%M"),
        created.report.date_range.end.format("%Y-%m-%d %H:%M")
    );
    println!("\n{}", summary_table(&created.data.summary));
    for chart in &created.data.charts {
        println!("Chart: {} ({} points)", chart.title, chart.data.len());
    }
    Ok(())
}

/// Merge the optional config file with command-line flags. Flags win.
fn build_config(file: Option<&Path>, args: &CreateArgs, window_days: i64) -> Result<ReportConfig> {
    let mut config = match file {
        Some(path) => read_config_file(path)?,
        None => ReportConfig::default(),
    };

    if let Some(title) = &args.title {
        config.title = title.clone();
    }
    if args.description.is_some() {
        config.description = args.description.clone();
    }
    if args.report_type.is_some() {
        config.report_type = args.report_type.clone();
    }
    if !args.fields.is_empty() {
        config.selected_fields = Some(args.fields.clone());
    }
    if args.group_by.is_some() {
        config.group_by = args.group_by.clone();
    }
    if args.sort_by.is_some() {
        config.sort_by = args.sort_by.clone();
    }
    if args.sort_order.is_some() {
        config.sort_order = args.sort_order.clone();
    }
    if args.format.is_some() {
        config.format = args.format.clone();
    }
    if args.author.is_some() {
        config.created_by = args.author.clone();
    }
    if args.default_charts {
        config.chart_configs.extend(default_chart_specs());
    }
    if args.no_charts {
        config.include_charts = Some(false);
    }

    if let Some(range) = parse_range(
        args.filters.from.as_deref(),
        args.filters.to.as_deref(),
        window_days,
    )? {
        config.date_range = Some(range);
    }

    let filters = report_filters(&args.filters);
    let merge = |target: &mut Vec<String>, extra: Vec<String>| {
        if !extra.is_empty() {
            *target = extra;
        }
    };
    merge(&mut config.filters.students, filters.students);
    merge(&mut config.filters.classes, filters.classes);
    merge(&mut config.filters.subjects, filters.subjects);
    merge(&mut config.filters.quiz_types, filters.quiz_types);
    merge(&mut config.filters.difficulty_levels, filters.difficulty_levels);

    Ok(config)
}

fn read_config_file(path: &Path) -> Result<ReportConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read report config: {}", path.display()))?;
    let config: ReportConfig = if path.extension().and_then(|e| e.to_str()) == Some("json") {
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse report config: {}", path.display()))?
    } else {
        toml::from_str(&content)
            .with_context(|| format!("failed to parse report config: {}", path.display()))?
    };
    Ok(config)
}
