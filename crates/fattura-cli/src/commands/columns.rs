//! Columns command - list the columns a set of invoices produces.

use clap::Args;
use console::style;
use indicatif::ProgressBar;
use serde::Serialize;

use fattura_core::{DEFAULT_COLUMNS, ResultTable};

use super::config::load_config;
use super::input::{ExtractionArgs, build_extractor, collect_report, resolve_inputs};

/// Arguments for the columns command.
#[derive(Args)]
pub struct ColumnsArgs {
    /// Input XML files, folders, ZIP archives or glob patterns
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Print the column list as JSON
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    extraction: ExtractionArgs,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct ColumnInfo {
    name: String,
    /// Rows with a non-null value.
    filled: usize,
    default: bool,
}

pub async fn run(args: ColumnsArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;
    args.extraction.apply(&mut config);
    // Descriptions are irrelevant here
    config.summarizer.enabled = false;

    let inputs = resolve_inputs(&args.inputs)?;
    let extractor = build_extractor(&config)?;

    let report = tokio::task::spawn_blocking(move || {
        collect_report(&inputs, &extractor, &ProgressBar::hidden())
    })
    .await?;

    for failure in &report.failures {
        eprintln!(
            "{} {}: {}",
            style("✗").red(),
            failure.name,
            failure.message
        );
    }

    let columns = column_info(&report.table);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&columns)?);
        return Ok(());
    }

    for column in &columns {
        let marker = if column.default { "*" } else { " " };
        println!(
            "{} {:<60} {}/{}",
            marker,
            column.name,
            column.filled,
            report.table.len()
        );
    }

    println!();
    println!(
        "{} {} columns, {} rows ({} = default selection)",
        style("ℹ").blue(),
        columns.len(),
        report.table.len(),
        style("*").bold()
    );

    Ok(())
}

fn column_info(table: &ResultTable) -> Vec<ColumnInfo> {
    table
        .columns()
        .into_iter()
        .map(|name| {
            let filled = table
                .rows()
                .iter()
                .filter(|row| row.get(&name).is_some())
                .count();
            let default = DEFAULT_COLUMNS.contains(&name.as_str());
            ColumnInfo {
                name,
                filled,
                default,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fattura_core::FlatRecord;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_column_info_counts_values() {
        let mut table = ResultTable::new();
        let first: FlatRecord = [("Numero", Some("1".to_string())), ("Extra", Some("x".to_string()))]
            .into_iter()
            .collect();
        let second: FlatRecord = [("Numero", None), ("Extra", Some("y".to_string()))]
            .into_iter()
            .collect();
        table.extend([first, second]);

        assert_eq!(
            column_info(&table),
            vec![
                ColumnInfo {
                    name: "Numero".to_string(),
                    filled: 1,
                    default: true,
                },
                ColumnInfo {
                    name: "Extra".to_string(),
                    filled: 2,
                    default: false,
                },
            ]
        );
    }
}
