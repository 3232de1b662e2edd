//! Process command - flatten a single invoice file.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::Args;
use console::style;
use tracing::{debug, info};

use fattura_core::export;
use fattura_core::{InvoiceExtractor, ResultTable};

use super::config::load_config;
use super::input::{ExtractionArgs, build_extractor};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input FatturaPA XML file
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    #[command(flatten)]
    extraction: ExtractionArgs,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON array of rows
    Json,
    /// CSV with every column
    Csv,
    /// Plain text, one block per row
    Text,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    args.extraction.apply(&mut config);

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let bytes = fs::read(&args.input)?;

    // The blocking HTTP client must be built and dropped off the runtime
    let worker_config = config.clone();
    let rows = tokio::task::spawn_blocking(move || -> anyhow::Result<_> {
        let extractor = build_extractor(&worker_config)?;
        Ok(extractor.extract_bytes(&bytes))
    })
    .await??
    .with_context(|| format!("Failed to process {}", args.input.display()))?;

    let mut table = ResultTable::new();
    table.extend(rows);
    let columns = table.columns();

    let output = match args.format {
        OutputFormat::Json => export::to_json(&table, &columns)?,
        OutputFormat::Csv => {
            export::to_csv_string(&table, &columns, config.export.csv_delimiter)?
        }
        OutputFormat::Text => format_text(&table),
    };

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} {} rows written to {}",
            style("✓").green(),
            table.len(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

fn format_text(table: &ResultTable) -> String {
    let mut output = String::new();

    for (index, row) in table.rows().iter().enumerate() {
        if index > 0 {
            output.push('\n');
        }
        output.push_str(&format!("Row {}:\n", index + 1));
        for (key, value) in row.iter() {
            output.push_str(&format!("  {}: {}\n", key, value.unwrap_or("-")));
        }
    }

    output
}
