//! The `quizlens export` command.

use std::path::PathBuf;

use anyhow::Result;

use quizlens_export::share::DirectoryShareTarget;
use quizlens_export::Exporter;

use super::Context;

pub async fn execute(
    ctx: &Context,
    id: String,
    format: String,
    output: Option<PathBuf>,
    share_dir: Option<PathBuf>,
) -> Result<()> {
    let engine = ctx.engine()?;
    let mut exporter = Exporter::new(engine);
    if let Some(dir) = output {
        exporter = exporter.with_output_dir(dir);
    }

    let artifact = exporter.export_report(&id, &format).await?;
    println!("{}", artifact.message);
    println!("Written to {}", artifact.uri);

    if let Some(dir) = share_dir {
        let dest = exporter
            .share(&artifact, &DirectoryShareTarget::new(dir))
            .await?;
        println!("Shared to {dest}");
    }
    Ok(())
}
