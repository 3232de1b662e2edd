//! Invoice row extraction module.

mod extractor;

pub use extractor::{
    DESCRIPTION_KEY, DESCRIPTION_SEPARATOR, FatturaExtractor, GENERAL_PATH, HEADER_PATH,
    InvoiceParts, LINE_PATH, SUMMARY_PATH,
};

use crate::error::FatturaError;
use crate::models::record::InvoiceRow;
use crate::xml::XmlElement;

/// Trait for invoice row extractors.
pub trait InvoiceExtractor {
    /// Extract table rows from a parsed document.
    fn extract(&self, document: &XmlElement) -> Vec<InvoiceRow>;

    /// Parse raw XML bytes and extract table rows.
    fn extract_bytes(&self, bytes: &[u8]) -> Result<Vec<InvoiceRow>, FatturaError>;
}
