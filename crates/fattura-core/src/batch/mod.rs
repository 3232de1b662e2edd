//! Batch aggregation of many invoice documents into one result table.

mod source;

pub use source::{FileSources, SourceItem, XML_SUFFIX, XmlSource, ZipSources, xml_files_in_dir};

use std::io::{Read, Seek};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::FatturaError;
use crate::invoice::InvoiceExtractor;
use crate::table::ResultTable;

/// A source that produced no rows, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFailure {
    /// File name or archive entry name.
    pub name: String,
    /// Human-readable error description.
    pub message: String,
}

impl SourceFailure {
    pub fn new(name: impl Into<String>, error: impl std::fmt::Display) -> Self {
        Self {
            name: name.into(),
            message: error.to_string(),
        }
    }
}

/// Outcome of a batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Rows of every successfully extracted document.
    pub table: ResultTable,
    /// Sources that failed, in processing order.
    pub failures: Vec<SourceFailure>,
    /// Number of sources attempted.
    pub processed: usize,
}

impl BatchReport {
    /// Number of sources that produced rows.
    pub fn succeeded(&self) -> usize {
        self.processed - self.failures.len()
    }

    /// True when no source produced any row.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// Folds documents into a [`BatchReport`], one source at a time.
///
/// A failing source is recorded and skipped; rows are appended only after a
/// document has been fully extracted.
pub struct BatchAggregator<'a, E: ?Sized> {
    extractor: &'a E,
    report: BatchReport,
}

impl<'a, E: InvoiceExtractor + ?Sized> BatchAggregator<'a, E> {
    pub fn new(extractor: &'a E) -> Self {
        Self {
            extractor,
            report: BatchReport::default(),
        }
    }

    /// Extract one source and fold its rows into the table.
    ///
    /// Returns `false` when the source failed.
    pub fn add_source(&mut self, source: &XmlSource) -> bool {
        self.report.processed += 1;

        match self.extractor.extract_bytes(&source.bytes) {
            Ok(rows) => {
                debug!("{}: {} rows", source.name, rows.len());
                self.report.table.extend(rows);
                true
            }
            Err(e) => {
                warn!("Failed to process {}: {}", source.name, e);
                self.report.failures.push(SourceFailure::new(&source.name, e));
                false
            }
        }
    }

    /// Record a source that could not even be read.
    pub fn add_failure(&mut self, failure: SourceFailure) {
        warn!("Failed to read {}: {}", failure.name, failure.message);
        self.report.processed += 1;
        self.report.failures.push(failure);
    }

    /// Process a read result: extract on success, record on failure.
    pub fn add_item(&mut self, item: SourceItem) -> bool {
        match item {
            Ok(source) => self.add_source(&source),
            Err(failure) => {
                self.add_failure(failure);
                false
            }
        }
    }

    /// Process every item of a lazy source iterator.
    pub fn add_items(&mut self, items: impl IntoIterator<Item = SourceItem>) {
        for item in items {
            self.add_item(item);
        }
    }

    /// Process every `.xml` entry of a ZIP archive.
    pub fn add_archive<R: Read + Seek>(&mut self, reader: R) -> Result<(), FatturaError> {
        let entries = ZipSources::new(reader)?;
        self.add_items(entries);
        Ok(())
    }

    pub fn report(&self) -> &BatchReport {
        &self.report
    }

    pub fn finish(self) -> BatchReport {
        info!(
            "Batch complete: {} sources, {} failed, {} rows",
            self.report.processed,
            self.report.failures.len(),
            self.report.table.len()
        );
        self.report
    }
}

/// Extract every source in order into one report.
pub fn process_sources<E: InvoiceExtractor + ?Sized>(
    sources: &[XmlSource],
    extractor: &E,
) -> BatchReport {
    let mut aggregator = BatchAggregator::new(extractor);
    for source in sources {
        aggregator.add_source(source);
    }
    aggregator.finish()
}

/// Extract every `.xml` entry of a ZIP archive into one report.
pub fn process_archive<R: Read + Seek, E: InvoiceExtractor + ?Sized>(
    reader: R,
    extractor: &E,
) -> Result<BatchReport, FatturaError> {
    let mut aggregator = BatchAggregator::new(extractor);
    aggregator.add_archive(reader)?;
    Ok(aggregator.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::FatturaExtractor;
    use pretty_assertions::assert_eq;
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;

    fn invoice(number: &str, lines: &[&str]) -> Vec<u8> {
        let lines: String = lines
            .iter()
            .map(|d| format!("<DettaglioLinee><Descrizione>{}</Descrizione></DettaglioLinee>", d))
            .collect();
        format!(
            "<p:FatturaElettronica xmlns:p=\"urn:fpa\"><FatturaElettronicaBody><DatiGenerali>\
             <DatiGeneraliDocumento><Numero>{}</Numero></DatiGeneraliDocumento></DatiGenerali>\
             <DatiBeniServizi>{}</DatiBeniServizi></FatturaElettronicaBody></p:FatturaElettronica>",
            number, lines
        )
        .into_bytes()
    }

    #[test]
    fn test_malformed_source_is_reported_not_thrown() {
        let sources = vec![
            XmlSource::new("1.xml", invoice("1", &["A", "B"])),
            XmlSource::new("2.xml", b"<FatturaElettronica><Body></FatturaElettronica>".to_vec()),
            XmlSource::new("3.xml", invoice("3", &["C"])),
        ];

        let report = process_sources(&sources, &FatturaExtractor::new());

        assert_eq!(report.processed, 3);
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.table.len(), 3);
        assert_eq!(report.table.value(0, "Numero"), Some("1"));
        assert_eq!(report.table.value(1, "Descrizione"), Some("B"));
        assert_eq!(report.table.value(2, "Numero"), Some("3"));

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].name, "2.xml");
        assert!(!report.failures[0].message.is_empty());
    }

    #[test]
    fn test_rows_follow_source_order() {
        let sources = vec![
            XmlSource::new("b.xml", invoice("2", &["X"])),
            XmlSource::new("a.xml", invoice("1", &["Y"])),
        ];

        let extractor = FatturaExtractor::new().with_line_detail(false);
        let report = process_sources(&sources, &extractor);

        assert_eq!(report.table.value(0, "Numero"), Some("2"));
        assert_eq!(report.table.value(1, "Numero"), Some("1"));
    }

    #[test]
    fn test_all_failures_leave_empty_table() {
        let sources = vec![XmlSource::new("bad.xml", b"not xml at all <".to_vec())];

        let report = process_sources(&sources, &FatturaExtractor::new());
        assert!(report.is_empty());
        assert_eq!(report.failures.len(), 1);
    }

    #[test]
    fn test_archive_sources() {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, body) in [
            ("001.xml", invoice("1", &["A"])),
            ("readme.txt", b"skip".to_vec()),
            ("002.xml", b"<broken".to_vec()),
            ("003.xml", invoice("3", &["B", "C"])),
        ] {
            writer.start_file(name, SimpleFileOptions::default()).unwrap();
            writer.write_all(&body).unwrap();
        }
        let data = writer.finish().unwrap().into_inner();

        let report = process_archive(Cursor::new(data), &FatturaExtractor::new()).unwrap();

        assert_eq!(report.processed, 3);
        assert_eq!(report.table.len(), 3);
        assert_eq!(report.failures[0].name, "002.xml");
    }

    #[test]
    fn test_unreadable_item_counts_as_failure() {
        let extractor = FatturaExtractor::new();
        let mut aggregator = BatchAggregator::new(&extractor);

        aggregator.add_items(vec![
            Err(SourceFailure::new("missing.xml", "file not found")),
            Ok(XmlSource::new("ok.xml", invoice("9", &[]))),
        ]);

        let report = aggregator.finish();
        assert_eq!(report.processed, 2);
        assert_eq!(report.table.len(), 1);
        assert_eq!(report.failures[0].message, "file not found");
    }

    #[test]
    fn test_deeply_nested_source_is_reported_not_thrown() {
        let depth = 20_000;
        let deep = format!("{}{}", "<a>".repeat(depth), "</a>".repeat(depth));
        let sources = vec![
            XmlSource::new("1.xml", invoice("1", &["A"])),
            XmlSource::new("deep.xml", deep.into_bytes()),
            XmlSource::new("3.xml", invoice("3", &["C"])),
        ];

        let report = process_sources(&sources, &FatturaExtractor::new());

        assert_eq!(report.processed, 3);
        assert_eq!(report.table.len(), 2);
        assert_eq!(report.table.value(1, "Numero"), Some("3"));
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].name, "deep.xml");
    }

    #[test]
    fn test_corrupt_archive_entry_is_reported() {
        let stored = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer.start_file("a.xml", stored).unwrap();
        writer.write_all(&invoice("CORRUPTME", &["A"])).unwrap();
        writer.start_file("b.xml", stored).unwrap();
        writer.write_all(&invoice("2", &["B"])).unwrap();
        let mut data = writer.finish().unwrap().into_inner();

        // Flip one stored byte so the entry fails its checksum.
        let at = data
            .windows(9)
            .position(|w| w == b"CORRUPTME")
            .unwrap();
        data[at] = b'X';

        let report = process_archive(Cursor::new(data), &FatturaExtractor::new()).unwrap();

        assert_eq!(report.processed, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].name, "a.xml");
        assert_eq!(report.table.len(), 1);
        assert_eq!(report.table.value(0, "Numero"), Some("2"));
    }
}
