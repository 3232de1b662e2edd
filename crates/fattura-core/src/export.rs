//! CSV, XLSX and JSON serialization of a result table.

use std::io::Write;
use std::path::Path;

use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use serde_json::{Map, Value};

use crate::error::ExportError;
use crate::models::config::{ExportConfig, ExportFormat};
use crate::table::ResultTable;

/// Result type for export operations.
pub type Result<T> = std::result::Result<T, ExportError>;

/// Spreadsheet cells hold at most this many characters.
const XLSX_MAX_CELL_CHARS: usize = 32_767;

/// Serialize `columns` of `table` in `format`.
pub fn to_bytes(
    table: &ResultTable,
    columns: &[String],
    format: ExportFormat,
    config: &ExportConfig,
) -> Result<Vec<u8>> {
    match format {
        ExportFormat::Csv => {
            let mut buffer = Vec::new();
            write_csv(table, columns, config.csv_delimiter, &mut buffer)?;
            Ok(buffer)
        }
        ExportFormat::Xlsx => xlsx_bytes(table, columns, &config.sheet_name),
        ExportFormat::Json => Ok(to_json(table, columns)?.into_bytes()),
    }
}

/// Write `columns` of `table` to `path` in `format`.
pub fn write_file(
    table: &ResultTable,
    columns: &[String],
    format: ExportFormat,
    config: &ExportConfig,
    path: &Path,
) -> Result<()> {
    let bytes = to_bytes(table, columns, format, config)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Write a header row of column names and one record per table row.
/// Null and absent cells are written as empty fields.
pub fn write_csv<W: Write>(
    table: &ResultTable,
    columns: &[String],
    delimiter: char,
    writer: W,
) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(delimiter_byte(delimiter))
        .from_writer(writer);

    wtr.write_record(columns)?;

    for row in table.rows() {
        wtr.write_record(columns.iter().map(|c| row.get(c).unwrap_or("")))?;
    }

    wtr.flush()?;
    Ok(())
}

/// CSV output as a string.
pub fn to_csv_string(table: &ResultTable, columns: &[String], delimiter: char) -> Result<String> {
    let mut buffer = Vec::new();
    write_csv(table, columns, delimiter, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

/// JSON array of objects keyed by column; nulls are kept.
pub fn to_json(table: &ResultTable, columns: &[String]) -> Result<String> {
    let rows: Vec<Value> = table
        .rows()
        .iter()
        .map(|row| {
            let object: Map<String, Value> = columns
                .iter()
                .map(|c| {
                    let value = row
                        .get(c)
                        .map(|v| Value::String(v.to_string()))
                        .unwrap_or(Value::Null);
                    (c.clone(), value)
                })
                .collect();
            Value::Object(object)
        })
        .collect();

    Ok(serde_json::to_string_pretty(&rows)?)
}

/// Build an XLSX workbook with a bold, frozen header row.
pub fn xlsx_bytes(table: &ResultTable, columns: &[String], sheet_name: &str) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name)?;

    let header_format = Format::new().set_bold();

    for (col, name) in columns.iter().enumerate() {
        write_text_cell(worksheet, 0, col as u16, name, Some(&header_format))?;
    }

    for (index, row) in table.rows().iter().enumerate() {
        let excel_row = (index + 1) as u32;
        for (col, name) in columns.iter().enumerate() {
            if let Some(value) = row.get(name) {
                write_text_cell(worksheet, excel_row, col as u16, value, None)?;
            }
        }
    }

    worksheet.set_freeze_panes(1, 0)?;
    worksheet.autofit();

    Ok(workbook.save_to_buffer()?)
}

fn write_text_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    text: &str,
    format: Option<&Format>,
) -> std::result::Result<(), XlsxError> {
    let text = truncate_chars(text, XLSX_MAX_CELL_CHARS);
    match format {
        Some(format) => worksheet.write_string_with_format(row, col, text, format)?,
        None => worksheet.write_string(row, col, text)?,
    };
    Ok(())
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

fn delimiter_byte(delimiter: char) -> u8 {
    if delimiter.is_ascii() {
        delimiter as u8
    } else {
        b','
    }
}
