//! Detect command - single-layer detection across every registered parser.

use std::path::PathBuf;

use clap::Args;
use console::style;

use super::{load_config, read_text, registry};

/// Arguments for the detect command.
#[derive(Args)]
pub struct DetectArgs {
    /// Text file extracted from the invoice PDF
    #[arg(required = true)]
    input: PathBuf,

    /// Minimum confidence (0 - 100) to select a supplier
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=100))]
    threshold: Option<u8>,

    /// Print the detection as JSON
    #[arg(long)]
    json: bool,
}

pub async fn run(args: DetectArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let text = read_text(&args.input)?;
    let registry = registry(&config);

    let detection = registry.detect_supplier(&text, args.threshold);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&detection)?);
        return Ok(());
    }

    for score in &detection.scores {
        let confidence = format!("{:>3}%", score.confidence);
        let confidence = if score.confidence >= detection.threshold {
            style(confidence).green()
        } else {
            style(confidence).dim()
        };
        println!(
            "{} {:<16} {:<24} {}",
            confidence, score.key, score.supplier_name, score.notes
        );
    }

    println!();
    match &detection.selected {
        Some(_) => println!(
            "{} {} (threshold {}%)",
            style("✓").green(),
            detection.notes,
            detection.threshold
        ),
        None => println!("{} {}", style("✗").red(), detection.notes),
    }

    Ok(())
}
