//! Batch command - flatten many invoices into one table.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use fattura_core::export;
use fattura_core::{ColumnSelection, ExportFormat, FatturaError};

use super::config::load_config;
use super::input::{ExtractionArgs, build_extractor, collect_report, resolve_inputs};

/// Output name used when `--output` is not given.
const DEFAULT_OUTPUT_STEM: &str = "elaborazione_fattura";

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input XML files, folders, ZIP archives or glob patterns
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Output file (default: elaborazione_fattura.<format>)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format (default: from --output extension, then config)
    #[arg(short, long, value_enum)]
    format: Option<TableFormat>,

    /// Columns to export: "default", "all" or a comma-separated list
    #[arg(long)]
    columns: Option<String>,

    /// CSV field delimiter
    #[arg(long)]
    delimiter: Option<char>,

    #[command(flatten)]
    extraction: ExtractionArgs,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum TableFormat {
    /// Comma-separated values
    Csv,
    /// Excel workbook
    Xlsx,
    /// JSON array of rows
    Json,
}

impl From<TableFormat> for ExportFormat {
    fn from(format: TableFormat) -> Self {
        match format {
            TableFormat::Csv => ExportFormat::Csv,
            TableFormat::Xlsx => ExportFormat::Xlsx,
            TableFormat::Json => ExportFormat::Json,
        }
    }
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    args.extraction.apply(&mut config);
    if let Some(delimiter) = args.delimiter {
        config.export.csv_delimiter = delimiter;
    }

    let selection: ColumnSelection = match &args.columns {
        Some(columns) => columns.parse()?,
        None => config.columns.selection(),
    };

    let format = args
        .format
        .map(ExportFormat::from)
        .or_else(|| args.output.as_deref().and_then(format_from_path))
        .unwrap_or(config.export.format);
    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("{}.{}", DEFAULT_OUTPUT_STEM, format.extension())));

    let inputs = resolve_inputs(&args.inputs)?;
    println!(
        "{} Found {} inputs to process",
        style("ℹ").blue(),
        inputs.len()
    );

    let pb = ProgressBar::new(inputs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} inputs {msg}")?
            .progress_chars("=>-"),
    );

    // The blocking HTTP client must be built and dropped off the runtime
    let worker_pb = pb.clone();
    let worker_config = config.clone();
    let report = tokio::task::spawn_blocking(move || -> anyhow::Result<_> {
        let extractor = build_extractor(&worker_config)?;
        Ok(collect_report(&inputs, &extractor, &worker_pb))
    })
    .await??;

    pb.finish_and_clear();

    println!();
    println!(
        "{} Processed {} documents in {:?}",
        style("✓").green(),
        report.processed,
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed, {} rows",
        style(report.succeeded()).green(),
        style(report.failures.len()).red(),
        report.table.len()
    );

    if !report.failures.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for failure in &report.failures {
            println!("  - {}: {}", failure.name, failure.message);
        }
    }

    if report.is_empty() {
        println!();
        println!(
            "{} No rows extracted, nothing to export",
            style("⚠").yellow()
        );
        return Ok(());
    }

    let selected = match report.table.select(&selection) {
        Ok(selected) => selected,
        Err(FatturaError::NoColumnsSelected) => {
            println!();
            println!(
                "{} None of the selected columns exist, nothing to export",
                style("⚠").yellow()
            );
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    if !selected.unknown.is_empty() {
        println!(
            "{} Unknown columns skipped: {}",
            style("⚠").yellow(),
            selected.unknown.join(", ")
        );
    }

    export::write_file(
        &report.table,
        &selected.columns,
        format,
        &config.export,
        &output_path,
    )?;
    debug!("Wrote {:?} output to {}", format, output_path.display());

    println!(
        "{} Wrote {} rows x {} columns to {}",
        style("✓").green(),
        report.table.len(),
        selected.columns.len(),
        output_path.display()
    );

    Ok(())
}

fn format_from_path(path: &Path) -> Option<ExportFormat> {
    let extension = path.extension()?.to_str()?.to_lowercase();
    match extension.as_str() {
        "csv" => Some(ExportFormat::Csv),
        "xlsx" => Some(ExportFormat::Xlsx),
        "json" => Some(ExportFormat::Json),
        _ => None,
    }
}
