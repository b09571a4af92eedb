use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};

mod coerce;
mod config;
mod loader;
mod logger;
mod models;
mod normalize;
mod report;
mod rubric;
mod schedule;

use crate::config::Config;
use crate::rubric::{Check, FirstEvaluation, RubricSubmission};
use crate::schedule::OvernightPolicy;

#[derive(Parser)]
#[command(name = "pontiapp-core")]
#[command(about = "Schedule materialization and evaluation rubric scoring for PontiApp", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Markdown,
    Csv,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge unavailability and class schedules into calendar occurrences
    Schedule {
        #[arg(long)]
        unavailability: Option<PathBuf>,
        #[arg(long)]
        classes: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Markdown)]
        format: OutputFormat,
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long, value_enum)]
        overnight: Option<OvernightPolicy>,
        /// Fail when the same id appears as two different event kinds
        #[arg(long)]
        strict: bool,
    },
    /// Score a weighted evaluation rubric
    Rubric {
        #[arg(long)]
        rubric: PathBuf,
        #[arg(long)]
        selections: PathBuf,
        /// Write the submission payload as JSON
        #[arg(long)]
        submission: Option<PathBuf>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Score the two-aspect first evaluation checklist
    FirstEval {
        #[arg(long, value_enum)]
        a: Check,
        #[arg(long, value_enum)]
        b: Check,
    },
}

fn emit(out: Option<&PathBuf>, contents: &str) -> anyhow::Result<()> {
    match out {
        Some(path) => {
            std::fs::write(path, contents)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Written to {}.", path.display());
        }
        None => print!("{contents}"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logger::init_logging();

    let cli = Cli::parse();

    match cli.command {
        Commands::Schedule {
            unavailability,
            classes,
            format,
            out,
            overnight,
            strict,
        } => {
            let config = Config::from_env()?.with_overrides(overnight, strict);
            let (unavailability, classes) =
                loader::load_schedule_sources(unavailability.as_deref(), classes.as_deref())
                    .await?;
            let schedule = schedule::materialize(&unavailability, &classes, config.overnight);

            for collision in schedule.collisions.iter() {
                tracing::warn!(
                    id = %collision.id,
                    kept = collision.kept.label(),
                    dropped = collision.dropped.label(),
                    "same id used by two event kinds"
                );
            }
            if config.strict {
                schedule.ensure_no_collisions()?;
            }

            tracing::info!(
                templates = schedule.templates.len(),
                occurrences = schedule.occurrences.len(),
                "schedule ready"
            );

            let contents = match format {
                OutputFormat::Markdown => report::build_schedule_report(&schedule),
                OutputFormat::Json => serde_json::to_string_pretty(&schedule)?,
                OutputFormat::Csv => {
                    let mut buffer = Vec::new();
                    report::write_occurrences_csv(&mut buffer, &schedule.occurrences)?;
                    String::from_utf8(buffer).context("csv output is not utf-8")?
                }
            };
            emit(out.as_ref(), &contents)?;
        }
        Commands::Rubric {
            rubric,
            selections,
            submission,
            out,
        } => {
            let definition = loader::load_rubric(&rubric).await?;
            if let Err(err) = definition.check_weights() {
                tracing::warn!(error = %err, "rubric weights are unbalanced");
            }
            let selections = loader::load_selections(&selections)?;
            let score = definition.score(&selections)?;

            tracing::info!(
                total = score.total,
                grade = score.grade,
                classification = score.classification.label(),
                pending = score.pending,
                "rubric scored"
            );

            if let Some(path) = submission {
                let payload = RubricSubmission::from_score(&score, chrono::Utc::now());
                let json = serde_json::to_string_pretty(&payload)?;
                std::fs::write(&path, json)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                println!("Submission {} written to {}.", payload.id, path.display());
            }

            emit(out.as_ref(), &report::build_rubric_report(&score))?;
        }
        Commands::FirstEval { a, b } => {
            let score = FirstEvaluation { a, b }.score();
            println!(
                "a {:.0} + b {:.0} = {:.0} ({})",
                score.a_obtained,
                score.b_obtained,
                score.total,
                score.classification.label()
            );
        }
    }

    Ok(())
}
