//! The `quizlens init` command.

use std::path::Path;

use anyhow::Result;

pub fn execute() -> Result<()> {
    write_if_missing(Path::new("quizlens.toml"), SAMPLE_CONFIG)?;
    write_if_missing(Path::new("records.json"), SAMPLE_RECORDS)?;

    println!("\nNext steps:");
    println!("  1. Replace records.json with your own attempt export (or keep the sample)");
    println!("  2. Run: quizlens create --title \"March\" --from 2025-03-01 --to 2025-03-31");
    println!("  3. Run: quizlens export --id <report id> --format csv");

    Ok(())
}

fn write_if_missing(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        println!("{} already exists, skipping.", path.display());
    } else {
        std::fs::write(path, content)?;
        println!("Created {}", path.display());
    }
    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# quizlens configuration

# Length of the default reporting window, in days.
default_window_days = 30

# Recorded as createdBy when a report names no author.
default_author = "system"

# ${VAR} references are expanded from the environment.
output_dir = "./quizlens-exports"
store_dir = "./.quizlens/reports"
attendance_log = "./.quizlens/attendance.jsonl"

# Uncomment to replace the built-in field registry. Reports without an explicit
# sortBy sort on student_name if it is listed, otherwise on the first field.
# [[fields]]
# key = "student_name"
# label = "Student Name"
"#;

const SAMPLE_RECORDS: &str = include_str!("../../fixtures/sample-records.json");
