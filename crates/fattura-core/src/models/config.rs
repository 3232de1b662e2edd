//! Configuration structures for the flattening pipeline.

use serde::{Deserialize, Serialize};

use crate::error::FatturaError;
use crate::table::ColumnSelection;

/// Main configuration for the fattura pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FatturaConfig {
    /// Row extraction configuration.
    pub extraction: ExtractionConfig,

    /// Column selection configuration.
    pub columns: ColumnsConfig,

    /// Description summarizer configuration.
    pub summarizer: SummarizerConfig,

    /// Export configuration.
    pub export: ExportConfig,
}

/// Row extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Emit one row per line item instead of one row per invoice.
    pub include_line_detail: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            include_line_detail: true,
        }
    }
}

/// How output columns are chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnMode {
    /// The default invoice columns that exist in the table.
    #[default]
    Default,
    /// Every column in the table.
    All,
    /// The columns listed in `custom`.
    Custom,
}

/// Column selection configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnsConfig {
    /// Selection mode.
    pub mode: ColumnMode,

    /// Column names used when `mode` is `custom`.
    pub custom: Vec<String>,
}

impl ColumnsConfig {
    /// The selection this configuration describes.
    pub fn selection(&self) -> ColumnSelection {
        match self.mode {
            ColumnMode::Default => ColumnSelection::Default,
            ColumnMode::All => ColumnSelection::All,
            ColumnMode::Custom => ColumnSelection::Custom(self.custom.clone()),
        }
    }
}

/// Description summarizer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizerConfig {
    /// Summarize joined line descriptions when line detail is off.
    pub enabled: bool,

    /// OpenAI-compatible chat completions endpoint.
    pub endpoint: String,

    /// Model name sent with each request.
    pub model: String,

    /// Environment variable holding the bearer token, if any.
    pub api_key_env: Option<String>,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Sampling temperature.
    pub temperature: f32,

    /// Upper bound on generated tokens.
    pub max_tokens: u32,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: "http://localhost:11434/v1/chat/completions".to_string(),
            model: "llama3.1".to_string(),
            api_key_env: None,
            timeout_secs: 30,
            temperature: 0.2,
            max_tokens: 32,
        }
    }
}

/// Output file format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    #[default]
    Csv,
    Xlsx,
    Json,
}

impl ExportFormat {
    /// Conventional file extension.
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Json => "json",
        }
    }
}

/// Export configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Default output format.
    pub format: ExportFormat,

    /// CSV field delimiter (`;` opens cleanly in Italian-locale Excel).
    pub csv_delimiter: char,

    /// Worksheet name for XLSX output.
    pub sheet_name: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            format: ExportFormat::Csv,
            csv_delimiter: ',',
            sheet_name: "Fatture".to_string(),
        }
    }
}

impl FatturaConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, FatturaError> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| FatturaError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), FatturaError> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| FatturaError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
