//! Input resolution and extractor setup shared by the commands.

use std::path::{Path, PathBuf};

use clap::Args;
use glob::glob;
use indicatif::ProgressBar;
use tracing::{debug, info, warn};

use fattura_core::models::config::FatturaConfig;
use fattura_core::{
    BatchAggregator, BatchReport, FatturaExtractor, FileSources, HttpSummarizer, SourceFailure,
    XML_SUFFIX, ZipSources, xml_files_in_dir,
};

/// Extraction flags; each overrides the matching config value.
#[derive(Args, Debug, Clone, Default)]
pub struct ExtractionArgs {
    /// Emit one row per line item
    #[arg(long, conflicts_with = "no_line_detail")]
    line_detail: bool,

    /// Emit one row per invoice with the line descriptions joined
    #[arg(long)]
    no_line_detail: bool,

    /// Shorten joined descriptions with the configured language model
    #[arg(long)]
    summarize: bool,
}

impl ExtractionArgs {
    pub fn apply(&self, config: &mut FatturaConfig) {
        if self.line_detail {
            config.extraction.include_line_detail = true;
        }
        if self.no_line_detail {
            config.extraction.include_line_detail = false;
        }
        if self.summarize {
            config.summarizer.enabled = true;
        }
    }
}

/// Build the extractor described by `config`.
pub fn build_extractor(config: &FatturaConfig) -> anyhow::Result<FatturaExtractor> {
    let mut extractor =
        FatturaExtractor::new().with_line_detail(config.extraction.include_line_detail);

    if config.summarizer.enabled {
        if config.extraction.include_line_detail {
            warn!("Summarizer has no effect while line detail is on");
        }
        let summarizer = HttpSummarizer::from_config(&config.summarizer)?;
        info!(
            "Summarizing descriptions with {} via {}",
            config.summarizer.model,
            summarizer.endpoint()
        );
        extractor = extractor.with_summarizer(Box::new(summarizer));
    }

    Ok(extractor)
}

/// One resolved command-line input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Xml(PathBuf),
    Archive(PathBuf),
}

impl Input {
    fn path(&self) -> &Path {
        match self {
            Input::Xml(path) | Input::Archive(path) => path,
        }
    }
}

/// Expand files, folders and glob patterns into inputs.
///
/// Named files are taken as given; folders and glob matches keep only
/// `.xml` files and `.zip` archives.
pub fn resolve_inputs(patterns: &[String]) -> anyhow::Result<Vec<Input>> {
    let mut inputs = Vec::new();

    for pattern in patterns {
        let path = Path::new(pattern);

        if path.is_dir() {
            let files = xml_files_in_dir(path)?;
            debug!("{}: {} XML files", path.display(), files.len());
            inputs.extend(files.into_iter().map(Input::Xml));
        } else if path.is_file() {
            inputs.push(classify(path.to_path_buf()));
        } else {
            let matched: Vec<Input> = glob(pattern)?
                .filter_map(|r| r.ok())
                .filter(|p| p.is_file())
                .filter(|p| is_archive(p) || has_xml_suffix(p))
                .map(classify)
                .collect();
            debug!("{}: {} matches", pattern, matched.len());
            inputs.extend(matched);
        }
    }

    if inputs.is_empty() {
        anyhow::bail!("No matching files found for: {}", patterns.join(" "));
    }

    Ok(inputs)
}

/// Run every input through the extractor, advancing `pb` once per input.
pub fn collect_report(
    inputs: &[Input],
    extractor: &FatturaExtractor,
    pb: &ProgressBar,
) -> BatchReport {
    let mut aggregator = BatchAggregator::new(extractor);

    for input in inputs {
        pb.set_message(input.path().display().to_string());

        match input {
            Input::Xml(path) => aggregator.add_items(FileSources::new(vec![path.clone()])),
            Input::Archive(path) => match ZipSources::open(path) {
                Ok(entries) => aggregator.add_items(entries),
                Err(e) => aggregator.add_failure(SourceFailure::new(path.display().to_string(), e)),
            },
        }

        pb.inc(1);
    }

    aggregator.finish()
}

fn classify(path: PathBuf) -> Input {
    if is_archive(&path) {
        Input::Archive(path)
    } else {
        Input::Xml(path)
    }
}

fn is_archive(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("zip"))
}

fn has_xml_suffix(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(XML_SUFFIX))
}
