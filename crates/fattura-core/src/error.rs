//! Error types for the fattura-core library.

use thiserror::Error;

/// Main error type for the fattura library.
#[derive(Error, Debug)]
pub enum FatturaError {
    /// The document is not well-formed XML.
    #[error("XML error: {0}")]
    Xml(#[from] XmlError),

    /// A ZIP archive could not be opened or read.
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Summarizer service error.
    #[error("summarizer error: {0}")]
    Summarizer(#[from] SummarizerError),

    /// Export error.
    #[error("export error: {0}")]
    Export(#[from] ExportError),

    /// None of the requested columns exist in the table.
    #[error("no columns selected: none of the requested columns exist in the table")]
    NoColumnsSelected,

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised while reading an XML document.
#[derive(Error, Debug)]
pub enum XmlError {
    /// The reader rejected the input.
    #[error("malformed XML at byte {position}: {message}")]
    Malformed { position: u64, message: String },

    /// The input contains no root element.
    #[error("document has no root element")]
    NoRoot,

    /// The input ended while elements were still open.
    #[error("unexpected end of document: <{0}> is not closed")]
    Unclosed(String),

    /// Elements are nested deeper than the supported limit.
    #[error("elements nested deeper than {0} levels")]
    TooDeep(usize),

    /// Names or text cannot be decoded with the document encoding.
    #[error("cannot decode document text: {0}")]
    Encoding(String),
}

/// Errors from the text summarizer collaborator.
#[derive(Error, Debug)]
pub enum SummarizerError {
    /// The HTTP client could not be built or the request failed.
    #[error("request failed: {0}")]
    Request(String),

    /// The service did not answer within the configured timeout.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// The service answered with a non-success status.
    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The response could not be decoded.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The service returned no usable label.
    #[error("empty response")]
    EmptyResponse,
}

/// Errors raised while serializing a result table.
#[derive(Error, Debug)]
pub enum ExportError {
    /// CSV writer error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Spreadsheet writer error.
    #[error("XLSX error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error while flushing output.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialized output is not valid UTF-8.
    #[error("encoding error: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// Result type for the fattura library.
pub type Result<T> = std::result::Result<T, FatturaError>;
