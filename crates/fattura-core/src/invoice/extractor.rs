//! FatturaPA row extractor: region lookup, merge and row fan-out.

use tracing::debug;

use crate::error::FatturaError;
use crate::models::record::{FlatRecord, InvoiceRow, LineItem};
use crate::summarizer::{Summarizer, summarize_or_fallback};
use crate::xml::{XmlElement, flatten, flatten_into};

use super::InvoiceExtractor;

/// Transmission header region.
pub const HEADER_PATH: &str = "FatturaElettronicaHeader";
/// General document data region.
pub const GENERAL_PATH: &str = "FatturaElettronicaBody/DatiGenerali/DatiGeneraliDocumento";
/// VAT summary regions.
pub const SUMMARY_PATH: &str = "FatturaElettronicaBody/DatiBeniServizi/DatiRiepilogo";
/// Line item regions.
pub const LINE_PATH: &str = "FatturaElettronicaBody/DatiBeniServizi/DettaglioLinee";

/// Line item key holding the goods/service description.
pub const DESCRIPTION_KEY: &str = "Descrizione";
/// Separator used to join descriptions when line detail is off.
pub const DESCRIPTION_SEPARATOR: &str = " | ";

/// The flattened regions of one invoice document.
#[derive(Debug, Clone, Default)]
pub struct InvoiceParts {
    /// Header, general data and merged summaries, in that precedence.
    pub base: FlatRecord,
    /// One record per `DettaglioLinee`.
    pub lines: Vec<LineItem>,
    /// Non-null `Descrizione` values of the line items, in order.
    pub descriptions: Vec<String>,
}

impl InvoiceParts {
    /// Locate and flatten the regions of `document`.
    pub fn from_document(document: &XmlElement) -> Self {
        let mut base = FlatRecord::new();

        if let Some(header) = document.find(HEADER_PATH) {
            base.merge(&flatten(header, ""));
        }

        if let Some(general) = document.find(GENERAL_PATH) {
            base.merge(&flatten(general, ""));
        }

        let mut summary = FlatRecord::new();
        for riepilogo in document.find_all(SUMMARY_PATH) {
            flatten_into(riepilogo, "", &mut summary);
        }
        base.merge(&summary);

        let lines: Vec<LineItem> = document
            .find_all(LINE_PATH)
            .into_iter()
            .map(|line| flatten(line, ""))
            .collect();

        let descriptions = lines
            .iter()
            .filter_map(|line| line.get(DESCRIPTION_KEY))
            .map(str::to_string)
            .collect();

        Self {
            base,
            lines,
            descriptions,
        }
    }
}

/// Extracts table rows from FatturaPA documents.
pub struct FatturaExtractor {
    /// Emit one row per line item.
    include_line_detail: bool,
    /// Optional label generator for joined descriptions.
    summarizer: Option<Box<dyn Summarizer>>,
}

impl FatturaExtractor {
    /// Create an extractor with line detail enabled and no summarizer.
    pub fn new() -> Self {
        Self {
            include_line_detail: true,
            summarizer: None,
        }
    }

    /// Set line detail mode.
    pub fn with_line_detail(mut self, include: bool) -> Self {
        self.include_line_detail = include;
        self
    }

    /// Summarize joined descriptions when line detail is off.
    pub fn with_summarizer(mut self, summarizer: Box<dyn Summarizer>) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    pub fn include_line_detail(&self) -> bool {
        self.include_line_detail
    }

    /// Build the output rows for already-flattened invoice parts.
    pub fn build_rows(&self, parts: InvoiceParts) -> Vec<InvoiceRow> {
        let InvoiceParts {
            mut base,
            lines,
            descriptions,
        } = parts;

        if !self.include_line_detail && !descriptions.is_empty() {
            let joined = descriptions.join(DESCRIPTION_SEPARATOR);
            let description = match &self.summarizer {
                Some(summarizer) => summarize_or_fallback(summarizer.as_ref(), &joined),
                None => joined,
            };
            base.insert(DESCRIPTION_KEY, Some(description));
            return vec![base];
        }

        let mut lines = lines.into_iter();
        let first_line = match lines.next() {
            Some(line) if self.include_line_detail => line,
            _ => return vec![base],
        };

        let first_row = base.merged(&first_line);
        let blank = first_row.nulled();

        let mut rows = Vec::with_capacity(lines.len() + 1);
        rows.push(first_row);
        rows.extend(lines.map(|line| blank.clone().merged(&line)));
        rows
    }
}

impl Default for FatturaExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl InvoiceExtractor for FatturaExtractor {
    fn extract(&self, document: &XmlElement) -> Vec<InvoiceRow> {
        let parts = InvoiceParts::from_document(document);
        let line_count = parts.lines.len();

        let rows = self.build_rows(parts);
        debug!(
            "Extracted {} rows from {} line items (line detail: {})",
            rows.len(),
            line_count,
            self.include_line_detail
        );
        rows
    }

    fn extract_bytes(&self, bytes: &[u8]) -> Result<Vec<InvoiceRow>, FatturaError> {
        let document = XmlElement::parse(bytes)?;
        Ok(self.extract(&document))
    }
}
