use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use iaw_annotation_crops::local::{LocalRenderOptions, LocalRenderReport, render_local_table};
use iaw_annotation_crops::models::DEFAULT_LANGUAGE;
use iaw_annotation_crops::table::CropQuality;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "annotation-table",
    version,
    about = "Crop annotated polygon regions and render them as an HTML table"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Render a table from a local image and an annotations JSON file.
    Render(RenderArgs),
}

#[derive(Debug, Args)]
struct RenderArgs {
    /// Full-resolution image the annotations refer to.
    #[arg(short, long)]
    image: PathBuf,

    /// JSON array of annotations as returned by the annotation-set endpoint.
    #[arg(short, long)]
    annotations: PathBuf,

    /// Output HTML path.
    #[arg(short, long)]
    output: PathBuf,

    /// Keep only annotations whose title or tags contain this keyword.
    #[arg(short, long)]
    keyword: Option<String>,

    /// Language of the field values to read.
    #[arg(long, default_value = DEFAULT_LANGUAGE)]
    lang: String,

    /// Leave the image cell empty instead of failing on a bad selector.
    #[arg(long)]
    best_effort: bool,

    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,
}

fn run_render(args: &RenderArgs) -> Result<LocalRenderReport> {
    let options = LocalRenderOptions {
        keyword: args.keyword.clone(),
        language: args.lang.clone(),
        quality: if args.best_effort {
            CropQuality::BestEffort
        } else {
            CropQuality::Strict
        },
    };

    let report = render_local_table(&args.image, &args.annotations, &options)
        .with_context(|| format!("failed to render '{}'", args.annotations.display()))?;
    std::fs::write(&args.output, &report.html)
        .with_context(|| format!("failed to write '{}'", args.output.display()))?;
    Ok(report)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let Commands::Render(args) = cli.command;

    let default_filter = if args.verbose {
        "iaw_annotation_crops=debug"
    } else {
        "iaw_annotation_crops=warn"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    match run_render(&args) {
        Ok(report) => {
            eprintln!(
                "rendered {} of {} annotation(s) to {}",
                report.row_count,
                report.total_annotations,
                args.output.display()
            );
            if report.row_count > 0 {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            }
        }
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::from(1)
        }
    }
}
