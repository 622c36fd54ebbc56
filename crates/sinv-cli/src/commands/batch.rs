//! Batch command - parse many invoice text files concurrently.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Args;
use console::style;
use futures_util::stream::{self, StreamExt};
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use sinv_core::models::result::ParseResult;
use sinv_core::{JsonProfileStore, MainSupplierMatcher, ParserRegistry, PipelineError};

use super::parse::{format_result, OutputFormat};
use super::{load_config, profile_matcher, registry};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern of invoice text files
    #[arg(required = true)]
    input: String,

    /// Supplier profiles JSON (overrides profiles.path)
    #[arg(short, long)]
    profiles: Option<PathBuf>,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Number of concurrent invocations
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Outcome of one file.
struct FileOutcome {
    path: PathBuf,
    result: Result<ParseResult, String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<ExitCode> {
    let start = Instant::now();

    let config = load_config(config_path)?;
    let matcher = profile_matcher(args.profiles.as_ref(), &config)?;
    let registry = registry(&config);

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file())
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    eprintln!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let mut pending = stream::iter(files)
        .map(|path| process_file(path, &registry, &matcher))
        .buffer_unordered(args.jobs.max(1));

    let mut outcomes = Vec::new();
    while let Some(outcome) = pending.next().await {
        pb.inc(1);

        if let Err(e) = &outcome.result {
            if args.continue_on_error {
                warn!("Failed to process {}: {}", outcome.path.display(), e);
            } else {
                error!("Failed to process {}: {}", outcome.path.display(), e);
                pb.abandon();
                anyhow::bail!("Processing failed for {}: {}", outcome.path.display(), e);
            }
        }

        outcomes.push(outcome);
    }

    pb.finish_and_clear();

    // Completion order is arbitrary
    outcomes.sort_by(|a, b| a.path.cmp(&b.path));

    if let Some(output_dir) = &args.output_dir {
        for outcome in &outcomes {
            if let Ok(result) = &outcome.result {
                let output_path = output_path(output_dir, &outcome.path, args.format);
                fs::write(&output_path, format_result(result, args.format)?)?;
                debug!("Wrote output to {}", output_path.display());
            }
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &outcomes)?;
        eprintln!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let failed: Vec<_> = outcomes.iter().filter(|o| o.result.is_err()).collect();
    let successful = outcomes.len() - failed.len();

    eprintln!();
    eprintln!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        outcomes.len(),
        start.elapsed()
    );
    eprintln!(
        "   {} successful, {} failed",
        style(successful).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        eprintln!();
        eprintln!("{}", style("Failed files:").red());
        for outcome in &failed {
            if let Err(e) = &outcome.result {
                eprintln!("  - {}: {}", outcome.path.display(), e);
            }
        }
        return Ok(ExitCode::FAILURE);
    }

    Ok(ExitCode::SUCCESS)
}

async fn process_file(
    path: PathBuf,
    registry: &ParserRegistry,
    matcher: &MainSupplierMatcher<JsonProfileStore>,
) -> FileOutcome {
    let file_start = Instant::now();

    let result = match tokio::fs::read_to_string(&path).await {
        Ok(text) => registry
            .parse_invoice(&text, matcher)
            .await
            .map_err(|e: PipelineError| e.to_string()),
        Err(e) => Err(format!("failed to read file: {}", e)),
    };

    FileOutcome {
        path,
        result,
        processing_time_ms: file_start.elapsed().as_millis() as u64,
    }
}

fn output_path(output_dir: &Path, input: &Path, format: OutputFormat) -> PathBuf {
    let name = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("invoice");
    output_dir.join(format!("{}.{}", name, format.extension()))
}

fn write_summary(path: &Path, outcomes: &[FileOutcome]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "supplier",
        "parser",
        "confidence",
        "invoice_number",
        "invoice_date",
        "items",
        "total_amount",
        "processing_time_ms",
        "error",
    ])?;

    for outcome in outcomes {
        let filename = outcome
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");
        let time_ms = outcome.processing_time_ms.to_string();

        match &outcome.result {
            Ok(result) => wtr.write_record([
                filename,
                "success",
                &result.supplier.name,
                &result.parser_used,
                &result.supplier.confidence.to_string(),
                &result.metadata.invoice_number,
                &result.metadata.invoice_date,
                &result.parsed_items.len().to_string(),
                &result.metadata.total_amount.to_string(),
                &time_ms,
                "",
            ])?,
            Err(e) => wtr.write_record([
                filename, "error", "", "", "", "", "", "", "", &time_ms, e,
            ])?,
        }
    }

    wtr.flush()?;
    Ok(())
}
