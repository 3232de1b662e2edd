//! Core library for flattening Italian electronic invoices (FatturaPA).
//!
//! This crate provides:
//! - A small XML element tree and a recursive path flattener
//! - Invoice row extraction with optional line-item fan-out
//! - Batch aggregation over files, folders and ZIP archives
//! - Optional summarization of line descriptions via a chat completions API
//! - Column selection and CSV/XLSX/JSON export

pub mod batch;
pub mod error;
pub mod export;
pub mod invoice;
pub mod models;
pub mod summarizer;
pub mod table;
pub mod xml;

pub use batch::{
    BatchAggregator, BatchReport, FileSources, SourceFailure, SourceItem, XML_SUFFIX, XmlSource,
    ZipSources, process_archive, process_sources, xml_files_in_dir,
};
pub use error::{ExportError, FatturaError, Result, SummarizerError, XmlError};
pub use invoice::{FatturaExtractor, InvoiceExtractor, InvoiceParts};
pub use models::config::{ColumnMode, ExportFormat, FatturaConfig};
pub use models::record::{FlatRecord, InvoiceRow, LineItem};
pub use summarizer::{Summarizer, summarize_or_fallback};
#[cfg(feature = "http")]
pub use summarizer::HttpSummarizer;
pub use table::{ColumnSelection, DEFAULT_COLUMNS, ResultTable, Selected};
pub use xml::{XmlElement, flatten, flatten_into};
