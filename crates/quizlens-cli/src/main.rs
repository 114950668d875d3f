//! quizlens CLI: build, inspect, and export quiz analytics reports.

use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "quizlens", version, about = "Quiz analytics reporting engine")]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// JSON file with the quiz attempt records to report on
    #[arg(long, global = true, default_value = "records.json")]
    records: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create and store a custom report, printing its summary
    Create(CreateArgs),

    /// Export a stored report to a file
    Export {
        /// Report id
        #[arg(long)]
        id: String,

        /// Output format: pdf, csv, json, xlsx
        #[arg(long, default_value = "pdf")]
        format: String,

        /// Output directory (defaults to the configured output_dir)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Copy the exported file into this directory afterwards
        #[arg(long)]
        share_dir: Option<PathBuf>,
    },

    /// Regenerate a stored report and print it
    Show {
        /// Report id
        #[arg(long)]
        id: String,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// List stored report definitions
    List,

    /// Track attendance or summarize it
    #[command(subcommand)]
    Attendance(AttendanceCommand),

    /// Time-on-task analytics over the records file
    Time {
        #[command(flatten)]
        filters: FilterArgs,

        /// Print the analytics as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the recognized report fields
    Fields,

    /// Create a starter config and sample records file
    Init,
}

#[derive(Args)]
struct CreateArgs {
    /// Report title
    #[arg(long)]
    title: Option<String>,

    /// Read the report configuration from a .toml or .json file
    #[arg(long)]
    from_file: Option<PathBuf>,

    /// Report description
    #[arg(long)]
    description: Option<String>,

    /// Report type: performance, attendance, time_analytics, engagement, custom
    #[arg(long = "type")]
    report_type: Option<String>,

    /// Fields to include, in order (comma-separated)
    #[arg(long, value_delimiter = ',')]
    fields: Vec<String>,

    /// Group details by this field
    #[arg(long)]
    group_by: Option<String>,

    /// Sort details by this field
    #[arg(long)]
    sort_by: Option<String>,

    /// Sort order: asc or desc
    #[arg(long)]
    sort_order: Option<String>,

    /// Default export format: pdf, csv, json, xlsx
    #[arg(long)]
    format: Option<String>,

    /// Attach the standard subject/score, score trend and difficulty charts
    #[arg(long)]
    default_charts: bool,

    /// Do not compute charts
    #[arg(long)]
    no_charts: bool,

    /// Author recorded on the definition
    #[arg(long)]
    author: Option<String>,

    #[command(flatten)]
    filters: FilterArgs,

    /// Print the created report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct FilterArgs {
    /// Start of the date range (YYYY-MM-DD or RFC 3339)
    #[arg(long)]
    from: Option<String>,

    /// End of the date range, inclusive (YYYY-MM-DD or RFC 3339)
    #[arg(long)]
    to: Option<String>,

    /// Student names or ids (comma-separated)
    #[arg(long, value_delimiter = ',')]
    students: Vec<String>,

    /// Classes (comma-separated)
    #[arg(long, value_delimiter = ',')]
    classes: Vec<String>,

    /// Subjects (comma-separated)
    #[arg(long, value_delimiter = ',')]
    subjects: Vec<String>,

    /// Quiz types (comma-separated)
    #[arg(long, value_delimiter = ',')]
    quiz_types: Vec<String>,

    /// Difficulty levels (comma-separated)
    #[arg(long, value_delimiter = ',')]
    difficulty: Vec<String>,
}

#[derive(Subcommand)]
enum AttendanceCommand {
    /// Record one attendance event
    Track {
        #[arg(long)]
        student: String,

        #[arg(long)]
        quiz: String,

        #[arg(long)]
        class: String,

        /// present, absent or late
        #[arg(long, default_value = "present")]
        status: String,

        /// full, partial or minimal
        #[arg(long, default_value = "full")]
        participation: String,

        /// Seconds spent
        #[arg(long, default_value = "0")]
        time_spent: f64,

        #[arg(long, default_value = "0")]
        questions: u32,

        /// Completion percentage (0-100)
        #[arg(long, default_value = "0")]
        completion: f64,

        /// Session time (defaults to now)
        #[arg(long)]
        date: Option<String>,
    },

    /// Summarize tracked attendance
    Report {
        #[arg(long, value_delimiter = ',')]
        students: Vec<String>,

        #[arg(long, value_delimiter = ',')]
        classes: Vec<String>,

        #[arg(long, value_delimiter = ',')]
        quizzes: Vec<String>,

        #[arg(long)]
        from: Option<String>,

        #[arg(long)]
        to: Option<String>,

        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("quizlens=info".parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let ctx = commands::Context {
        config_path: cli.config,
        records: cli.records,
    };

    let result = match cli.command {
        Commands::Create(args) => commands::create::execute(&ctx, args).await,
        Commands::Export {
            id,
            format,
            output,
            share_dir,
        } => commands::export::execute(&ctx, id, format, output, share_dir).await,
        Commands::Show { id, json } => commands::show::execute(&ctx, id, json).await,
        Commands::List => commands::list::execute(&ctx),
        Commands::Attendance(cmd) => commands::attendance::execute(&ctx, cmd),
        Commands::Time { filters, json } => commands::time::execute(&ctx, filters, json).await,
        Commands::Fields => commands::fields::execute(&ctx),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
