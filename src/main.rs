//! CLI entry point for the course grader.
//!
//! Provides subcommands for grading a course's data directory and for
//! inspecting the grading policy in effect.

use anyhow::Result;
use clap::{Parser, Subcommand};
use course_grader::{
    chart::{render_grade_bars, render_score_distribution},
    config::GradingPolicy,
    output::{partition_by_section, print_json, render_grade_counts, render_section, write_sections},
    pipeline::grade_course,
};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "course_grader")]
#[command(about = "Combine roster, homework/exam and quiz grades into final course grades", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Grade every student and write one CSV per section
    Grade {
        /// Directory holding roster.csv, hw_exam_grades.csv and quiz_*_grades.csv
        #[arg(short, long, default_value = "data")]
        data_dir: PathBuf,

        /// Directory to write section CSVs to (defaults to the data directory)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Optional: JSON grading policy overriding the built-in one
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Skip the grade and score charts
        #[arg(long, default_value_t = false)]
        no_charts: bool,

        /// Number of histogram bins for the final score chart
        #[arg(short, long, default_value_t = 20)]
        bins: usize,
    },
    /// Validate and print the grading policy in effect
    Policy {
        /// Optional: JSON grading policy overriding the built-in one
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/course_grader.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("course_grader.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Grade {
            data_dir,
            output_dir,
            config,
            no_charts,
            bins,
        } => {
            let policy = GradingPolicy::load_or_default(config.as_deref())?;
            let output_dir = output_dir.unwrap_or_else(|| data_dir.clone());

            let graded = grade_course(&data_dir, &policy)?;
            let reports = write_sections(&graded.table, &policy, &output_dir)?;

            for part in partition_by_section(&graded.table, &policy)? {
                println!("{}", render_section(&part, &policy));
            }
            for report in &reports {
                println!("Data saved to: {}", report.path.display());
            }

            println!("{}", render_grade_counts(&graded.summary));
            println!("Final Mean {}", graded.summary.mean);
            println!("Final Std {}", graded.summary.std_dev);

            if !no_charts {
                println!("{}", render_grade_bars(&graded.summary));
                println!("{}", render_score_distribution(&graded.summary, bins));
            }

            info!(
                sections = reports.len(),
                students = graded.summary.students(),
                output_dir = %output_dir.display(),
                "Grading finished"
            );
        }
        Commands::Policy { config } => {
            let policy = GradingPolicy::load_or_default(config.as_deref())?;
            info!(
                weight_sum = policy.weight_sum(),
                quizzes = policy.quiz_max_points.len(),
                quiz_max_total = policy.quiz_max_total(),
                "Grading policy is valid"
            );
            print_json(&policy)?;
        }
    }

    Ok(())
}
