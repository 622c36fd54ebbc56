//! CLI application for supplier invoice detection and parsing.

mod commands;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{batch, candidates, config, detect, parse};

/// Supplier invoices - detect the supplier and extract line items from invoice text
#[derive(Parser)]
#[command(name = "sinv")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect the supplier and parse a single invoice text file
    Parse(parse::ParseArgs),

    /// Score every registered parser against an invoice
    Detect(detect::DetectArgs),

    /// Rank supplier profiles against an invoice (coarse scan only)
    Candidates(candidates::CandidatesArgs),

    /// Parse multiple invoice text files
    Batch(batch::BatchArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Logs go to stderr so JSON output stays clean
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Parse(args) => parse::run(args, config_path).await,
        Commands::Detect(args) => detect::run(args, config_path).await.map(|_| ExitCode::SUCCESS),
        Commands::Candidates(args) => {
            candidates::run(args, config_path).await.map(|_| ExitCode::SUCCESS)
        }
        Commands::Batch(args) => batch::run(args, config_path).await,
        Commands::Config(args) => config::run(args).await.map(|_| ExitCode::SUCCESS),
    }
}
