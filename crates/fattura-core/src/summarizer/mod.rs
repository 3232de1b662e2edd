//! Short-label summarization of joined line descriptions.

#[cfg(feature = "http")]
mod http;

#[cfg(feature = "http")]
pub use http::HttpSummarizer;

use tracing::{debug, warn};

use crate::error::SummarizerError;

/// Result type for summarizer operations.
pub type Result<T> = std::result::Result<T, SummarizerError>;

/// Condenses a ` | `-joined list of line descriptions into a short label.
pub trait Summarizer: Send + Sync {
    /// Produce a short "categoria: dettaglio" label for `text`.
    fn summarize(&self, text: &str) -> Result<String>;
}

/// Summarize `text`, keeping it unchanged when the summarizer fails.
pub fn summarize_or_fallback(summarizer: &dyn Summarizer, text: &str) -> String {
    match summarizer.summarize(text) {
        Ok(label) => {
            debug!("Summarized {} chars into {:?}", text.len(), label);
            label
        }
        Err(e) => {
            warn!("Summarizer failed, keeping full description: {}", e);
            text.to_string()
        }
    }
}

/// Normalize a model answer into a single-line label.
#[cfg_attr(not(feature = "http"), allow(dead_code))]
pub(crate) fn clean_label(raw: &str) -> Option<String> {
    let line = raw.lines().map(str::trim).find(|l| !l.is_empty())?;
    let label = line
        .trim_matches(|c| c == '"' || c == '\'' || c == '`' || c == '«' || c == '»')
        .trim();

    if label.is_empty() {
        None
    } else {
        Some(label.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct Fixed(&'static str);

    impl Summarizer for Fixed {
        fn summarize(&self, _text: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct Failing;

    impl Summarizer for Failing {
        fn summarize(&self, _text: &str) -> Result<String> {
            Err(SummarizerError::Timeout(30))
        }
    }

    #[test]
    fn test_fallback_keeps_text() {
        assert_eq!(
            summarize_or_fallback(&Failing, "Servizio A | Servizio B"),
            "Servizio A | Servizio B"
        );
    }

    #[test]
    fn test_label_replaces_text() {
        assert_eq!(
            summarize_or_fallback(&Fixed("Servizi: consulenza"), "Servizio A | Servizio B"),
            "Servizi: consulenza"
        );
    }

    #[test]
    fn test_clean_label() {
        assert_eq!(clean_label("  \"Carburante: gasolio\"\n"), Some("Carburante: gasolio".to_string()));
        assert_eq!(clean_label("\n\nEnergia: luce\naltro testo"), Some("Energia: luce".to_string()));
        assert_eq!(clean_label(" \"\" "), None);
        assert_eq!(clean_label(""), None);
    }
}
