//! Summarizer backed by an OpenAI-compatible chat completions endpoint.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SummarizerError;
use crate::models::config::SummarizerConfig;

use super::{Result, Summarizer, clean_label};

const SYSTEM_PROMPT: &str = "\
Sei un assistente che classifica le righe di una fattura elettronica italiana. \
Ricevi le descrizioni delle righe separate da \" | \" e rispondi con UNA sola \
etichetta breve nel formato \"categoria: dettaglio\", al massimo 5 parole, \
senza virgolette, senza punteggiatura finale e senza spiegazioni.

Esempi corretti:
- \"Gasolio autotrazione | Additivo AdBlue\" -> Carburante: gasolio e AdBlue
- \"Canone assistenza software | Licenza annuale gestionale\" -> Software: assistenza e licenza
- \"Energia elettrica F1 | Energia elettrica F2 | Oneri di sistema\" -> Utenze: energia elettrica

Esempi sbagliati:
- \"La fattura riguarda l'acquisto di carburante per i mezzi aziendali\" (troppo lunga)
- \"Varie\" (troppo generica)
- \"Carburante: gasolio autotrazione e additivo AdBlue per camion\" (supera 5 parole)";

/// Chat completion request body.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

/// Chat completion response body (only the fields we read).
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Blocking HTTP summarizer.
pub struct HttpSummarizer {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    timeout_secs: u64,
    temperature: f32,
    max_tokens: u32,
}

impl HttpSummarizer {
    /// Build a summarizer from configuration.
    ///
    /// The bearer token, when `api_key_env` is set, is read from the
    /// environment once here.
    pub fn from_config(config: &SummarizerConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SummarizerError::Request(e.to_string()))?;

        let api_key = config
            .api_key_env
            .as_deref()
            .and_then(|var| std::env::var(var).ok())
            .filter(|key| !key.trim().is_empty());

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key,
            timeout_secs: config.timeout_secs,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Summarizer for HttpSummarizer {
    fn summarize(&self, text: &str) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                Message {
                    role: "user",
                    content: text,
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().map_err(|e| {
            if e.is_timeout() {
                SummarizerError::Timeout(self.timeout_secs)
            } else {
                SummarizerError::Request(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(SummarizerError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .map_err(|e| SummarizerError::InvalidResponse(e.to_string()))?;

        let label = label_from_response(parsed)?;
        debug!("Summarizer {} answered {:?}", self.endpoint, label);
        Ok(label)
    }
}

fn label_from_response(response: ChatResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .as_deref()
        .and_then(clean_label)
        .ok_or(SummarizerError::EmptyResponse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_request_body_shape() {
        let body = ChatRequest {
            model: "llama3.1",
            messages: vec![Message {
                role: "user",
                content: "Servizio A | Servizio B",
            }],
            temperature: 0.2,
            max_tokens: 32,
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "llama3.1");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "Servizio A | Servizio B");
        assert_eq!(json["max_tokens"], 32);
    }

    #[test]
    fn test_label_from_response() {
        let response: ChatResponse = serde_json::from_str(
            r#"{"choices": [{"message": {"role": "assistant", "content": "\"Servizi: consulenza\"\n"}}]}"#,
        )
        .unwrap();

        assert_eq!(label_from_response(response).unwrap(), "Servizi: consulenza");
    }

    #[test]
    fn test_empty_response_is_error() {
        let no_choices: ChatResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(matches!(
            label_from_response(no_choices),
            Err(SummarizerError::EmptyResponse)
        ));

        let null_content: ChatResponse =
            serde_json::from_str(r#"{"choices": [{"message": {"content": null}}]}"#).unwrap();
        assert!(label_from_response(null_content).is_err());
    }

    #[test]
    fn test_unreachable_endpoint_is_error() {
        let config = SummarizerConfig {
            enabled: true,
            endpoint: "http://127.0.0.1:9/v1/chat/completions".to_string(),
            timeout_secs: 2,
            ..SummarizerConfig::default()
        };

        let summarizer = HttpSummarizer::from_config(&config).unwrap();
        assert!(summarizer.summarize("Servizio A").is_err());
        assert_eq!(
            super::super::summarize_or_fallback(&summarizer, "Servizio A"),
            "Servizio A"
        );
    }
}
