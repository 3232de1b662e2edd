//! Named XML byte sources: single files, folders and ZIP archives.

use std::fs;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};

use tracing::debug;
use zip::ZipArchive;

use crate::error::FatturaError;

use super::SourceFailure;

/// Extension an archive entry or folder file must end with, case-sensitive.
pub const XML_SUFFIX: &str = ".xml";

/// One invoice document as raw bytes plus a display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlSource {
    /// File name or archive entry name.
    pub name: String,
    /// Raw document bytes.
    pub bytes: Vec<u8>,
}

impl XmlSource {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file, naming the source after its file name.
    pub fn from_path(path: &Path) -> Result<Self, FatturaError> {
        let bytes = fs::read(path)?;
        Ok(Self::new(display_name(path), bytes))
    }
}

/// Outcome of reading one source.
pub type SourceItem = Result<XmlSource, SourceFailure>;

/// XML files directly inside `dir` (not recursive), sorted by name.
pub fn xml_files_in_dir(dir: &Path) -> Result<Vec<PathBuf>, FatturaError> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_xml = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(XML_SUFFIX));
        if is_xml && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Reads files one at a time as they are iterated.
pub struct FileSources {
    paths: std::vec::IntoIter<PathBuf>,
}

impl FileSources {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self {
            paths: paths.into_iter(),
        }
    }

    /// Every XML file directly inside `dir`.
    pub fn from_dir(dir: &Path) -> Result<Self, FatturaError> {
        Ok(Self::new(xml_files_in_dir(dir)?))
    }
}

impl Iterator for FileSources {
    type Item = SourceItem;

    fn next(&mut self) -> Option<Self::Item> {
        let path = self.paths.next()?;
        Some(XmlSource::from_path(&path).map_err(|e| SourceFailure::new(display_name(&path), e)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.paths.size_hint()
    }
}

/// Reads the `.xml` entries of a ZIP archive one at a time.
///
/// Directory entries and entries with any other suffix are skipped.
pub struct ZipSources<R> {
    archive: ZipArchive<R>,
    index: usize,
}

impl<R: Read + Seek> ZipSources<R> {
    /// Open an archive from any seekable reader.
    pub fn new(reader: R) -> Result<Self, FatturaError> {
        let archive = ZipArchive::new(reader)?;
        debug!("Opened archive with {} entries", archive.len());
        Ok(Self { archive, index: 0 })
    }

    /// Number of entries in the archive, including skipped ones.
    pub fn entry_count(&self) -> usize {
        self.archive.len()
    }
}

impl ZipSources<std::io::BufReader<fs::File>> {
    /// Open an archive file.
    pub fn open(path: &Path) -> Result<Self, FatturaError> {
        let file = fs::File::open(path)?;
        Self::new(std::io::BufReader::new(file))
    }
}

impl<R: Read + Seek> Iterator for ZipSources<R> {
    type Item = SourceItem;

    fn next(&mut self) -> Option<Self::Item> {
        while self.index < self.archive.len() {
            let index = self.index;
            self.index += 1;

            let name = match self.archive.name_for_index(index) {
                Some(name) => name.to_string(),
                None => continue,
            };
            if name.ends_with('/') || !name.ends_with(XML_SUFFIX) {
                debug!("Skipping archive entry {}", name);
                continue;
            }

            return Some(read_entry(&mut self.archive, index, &name));
        }
        None
    }
}

fn read_entry<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    index: usize,
    name: &str,
) -> SourceItem {
    let mut entry = archive
        .by_index(index)
        .map_err(|e| SourceFailure::new(name, FatturaError::from(e)))?;

    let mut bytes = Vec::with_capacity(entry.size() as usize);
    entry
        .read_to_end(&mut bytes)
        .map_err(|e| SourceFailure::new(name, FatturaError::from(e)))?;

    Ok(XmlSource::new(name, bytes))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| path.display().to_string())
}
