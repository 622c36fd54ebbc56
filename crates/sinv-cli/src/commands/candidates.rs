//! Candidates command - coarse supplier ranking without invoking any parser.

use std::path::PathBuf;

use clap::Args;
use console::style;

use super::{load_config, profile_matcher, read_text};

/// Arguments for the candidates command.
#[derive(Args)]
pub struct CandidatesArgs {
    /// Text file extracted from the invoice PDF
    #[arg(required = true)]
    input: PathBuf,

    /// Supplier profiles JSON (overrides profiles.path)
    #[arg(short, long)]
    profiles: Option<PathBuf>,

    /// Print candidates as JSON
    #[arg(long)]
    json: bool,
}

pub async fn run(args: CandidatesArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let text = read_text(&args.input)?;
    let matcher = profile_matcher(args.profiles.as_ref(), &config)?;

    let candidates = matcher.find_candidates(&text).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&candidates)?);
        return Ok(());
    }

    if candidates.is_empty() {
        println!("{} No supplier profile matched", style("✗").red());
        return Ok(());
    }

    for (rank, candidate) in candidates.iter().enumerate() {
        println!(
            "{}. {:>3}% {} [{}/{}: {}]",
            rank + 1,
            candidate.confidence,
            style(&candidate.supplier_name).bold(),
            candidate.match_count,
            candidate.keywords.len(),
            candidate.matched_keywords.join(", ")
        );
    }

    Ok(())
}
