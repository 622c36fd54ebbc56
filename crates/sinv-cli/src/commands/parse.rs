//! Parse command - detect the supplier of a single invoice and extract it.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use tracing::{debug, info};

use sinv_core::models::result::ParseResult;
use sinv_core::PipelineError;

use super::{load_config, profile_matcher, read_text, registry};

/// Arguments for the parse command.
#[derive(Args)]
pub struct ParseArgs {
    /// Text file extracted from the invoice PDF
    #[arg(required = true)]
    input: PathBuf,

    /// Supplier profiles JSON (overrides profiles.path)
    #[arg(short, long)]
    profiles: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Give up after this many seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Report internal inconsistencies in the parsed invoice
    #[arg(long)]
    validate: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV of line items
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Text => "txt",
        }
    }
}

pub async fn run(args: ParseArgs, config_path: Option<&str>) -> anyhow::Result<ExitCode> {
    let start = Instant::now();

    let config = load_config(config_path)?;
    let text = read_text(&args.input)?;
    let matcher = profile_matcher(args.profiles.as_ref(), &config)?;
    let registry = registry(&config);

    info!("Parsing {}", args.input.display());

    let pipeline = registry.parse_invoice(&text, &matcher);
    let outcome = match args.timeout_secs {
        Some(secs) => match tokio::time::timeout(Duration::from_secs(secs), pipeline).await {
            Ok(outcome) => outcome,
            Err(_) => anyhow::bail!("Parsing timed out after {}s", secs),
        },
        None => pipeline.await,
    };

    debug!("Total processing time: {:?}", start.elapsed());

    let result = match outcome {
        Ok(result) => result,
        Err(e) => {
            print_failure(&e)?;
            return Ok(ExitCode::FAILURE);
        }
    };

    if args.validate {
        let issues = result.validate();
        if !issues.is_empty() {
            eprintln!("{}", style("Validation issues:").yellow());
            for issue in &issues {
                eprintln!("  - {}", issue);
            }
        }
    }

    let output = format_result(&result, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        eprintln!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    Ok(ExitCode::SUCCESS)
}

/// Print the failure report on stdout so callers can parse it.
pub fn print_failure(error: &PipelineError) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&error.to_failure())?);
    if let Some(suggestion) = error.suggestion() {
        eprintln!("{} {}", style("ℹ").blue(), suggestion);
    }
    Ok(())
}

pub fn format_result(result: &ParseResult, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Csv => format_csv(result),
        OutputFormat::Text => Ok(format_text(result)),
    }
}

fn format_csv(result: &ParseResult) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "supplier",
        "invoice_number",
        "invoice_date",
        "category",
        "sku",
        "name",
        "pack_size",
        "unit_size",
        "quantity",
        "unit_price",
        "nett_price",
        "vat_rate",
        "line_total",
    ])?;

    for item in &result.parsed_items {
        wtr.write_record([
            result.supplier.name.as_str(),
            &result.metadata.invoice_number,
            &result.metadata.invoice_date,
            item.category_header.as_deref().unwrap_or(""),
            &item.supplier_sku,
            &item.supplier_name,
            item.pack_size.as_deref().unwrap_or(""),
            item.unit_size.as_deref().unwrap_or(""),
            &item.quantity.to_string(),
            &item.unit_price.to_string(),
            &item.nett_price.to_string(),
            &item.vat_rate.map(|r| r.to_string()).unwrap_or_default(),
            &item.line_total.to_string(),
        ])?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(result: &ParseResult) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "Supplier: {} ({}%)\n",
        result.supplier.name, result.supplier.confidence
    ));
    output.push_str(&format!("Parser: {}\n", result.parser_used));
    output.push_str(&format!("Invoice: {}\n", result.metadata.invoice_number));
    output.push_str(&format!("Date: {}\n", result.metadata.invoice_date));
    output.push('\n');

    output.push_str(&format!("Items ({}):\n", result.parsed_items.len()));
    for item in &result.parsed_items {
        output.push_str(&format!(
            "  {:<10} {:<40} {:>6} x {:>8} = {:>9}\n",
            item.supplier_sku, item.supplier_name, item.quantity, item.unit_price, item.line_total
        ));
    }
    output.push('\n');

    output.push_str("Summary:\n");
    output.push_str(&format!("  Nett:  {}\n", result.metadata.subtotal));
    output.push_str(&format!("  VAT:   {}\n", result.metadata.vat_total));
    output.push_str(&format!("  Total: {}\n", result.metadata.total_amount));

    if !result.notes.is_empty() {
        output.push_str(&format!("\n{}\n", result.notes));
    }

    output
}
