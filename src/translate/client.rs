//! Core `Translator` trait and the `LibreTranslator` HTTP client.
//!
//! `LibreTranslator` speaks the LibreTranslate wire format:
//! `POST {base_url}/translate` with `{ q, source, target }` and a
//! `{ translatedText }` reply. All connection details come from
//! [`TranslationConfig`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::TranslationConfig;

// ---------------------------------------------------------------------------
// TranslateError
// ---------------------------------------------------------------------------

/// Errors that can occur while calling the translation service.
#[derive(Debug, Error)]
pub enum TranslateError {
    /// HTTP transport or connection error.
    #[error("translation request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("translation request timed out")]
    Timeout,

    /// The service answered with a non-success status.
    #[error("translation service returned HTTP {0}")]
    Status(u16),

    /// The response body was not the expected JSON.
    #[error("failed to parse translation response: {0}")]
    Parse(String),

    /// The service returned an empty translation.
    #[error("translation service returned empty text")]
    Empty,
}

impl From<reqwest::Error> for TranslateError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TranslateError::Timeout
        } else {
            TranslateError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Translator trait
// ---------------------------------------------------------------------------

/// A text-translation capability.
///
/// Implementors must be `Send + Sync` so they can be shared as
/// `Arc<dyn Translator>`. Implementations report failures; recovery is the
/// job of [`TranslationGateway`](super::TranslationGateway).
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, source: &str, target: &str)
        -> Result<String, TranslateError>;
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslateResponse {
    translated_text: Option<String>,
}

// ---------------------------------------------------------------------------
// LibreTranslator
// ---------------------------------------------------------------------------

/// Calls a LibreTranslate-compatible `/translate` endpoint.
pub struct LibreTranslator {
    client: reqwest::Client,
    config: TranslationConfig,
}

impl LibreTranslator {
    /// Build a translator from application config.
    ///
    /// The HTTP client carries the per-request timeout from
    /// `config.timeout_secs`. A default client is used if the builder fails.
    pub fn from_config(config: &TranslationConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/translate", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl Translator for LibreTranslator {
    /// The `api_key` body field is attached only when the configured key is
    /// non-empty.
    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, TranslateError> {
        let source = if self.config.detect_source { "auto" } else { source };
        let api_key = self.config.api_key.as_deref().filter(|k| !k.is_empty());

        let body = TranslateRequest {
            q: text,
            source,
            target,
            api_key,
        };

        let response = self.client.post(self.endpoint()).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TranslateError::Status(status.as_u16()));
        }

        let parsed: TranslateResponse = response
            .json()
            .await
            .map_err(|e| TranslateError::Parse(e.to_string()))?;

        let translated = parsed
            .translated_text
            .map(|t| t.trim().to_string())
            .unwrap_or_default();

        if translated.is_empty() {
            return Err(TranslateError::Empty);
        }

        Ok(translated)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn config_for(url: String) -> TranslationConfig {
        TranslationConfig {
            base_url: url,
            api_key: None,
            detect_source: false,
            timeout_secs: 5,
            retry_once: false,
        }
    }

    #[tokio::test]
    async fn posts_libretranslate_body_and_reads_translated_text() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/translate")
            .match_body(Matcher::Json(json!({
                "q": "गेहूं को कितना पानी चाहिए?",
                "source": "hi",
                "target": "en"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"translatedText":"How much water does wheat need?"}"#)
            .create_async()
            .await;

        let translator = LibreTranslator::from_config(&config_for(server.url()));
        let out = translator
            .translate("गेहूं को कितना पानी चाहिए?", "hi", "en")
            .await
            .unwrap();

        assert_eq!(out, "How much water does wheat need?");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn detect_source_sends_auto_and_api_key() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/translate")
            .match_body(Matcher::Json(json!({
                "q": "hello",
                "source": "auto",
                "target": "ta",
                "api_key": "secret"
            })))
            .with_status(200)
            .with_body(r#"{"translatedText":"வணக்கம்"}"#)
            .create_async()
            .await;

        let mut config = config_for(server.url());
        config.detect_source = true;
        config.api_key = Some("secret".into());

        let out = LibreTranslator::from_config(&config)
            .translate("hello", "en", "ta")
            .await
            .unwrap();

        assert_eq!(out, "வணக்கம்");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn http_error_status_is_reported() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/translate")
            .with_status(503)
            .create_async()
            .await;

        let err = LibreTranslator::from_config(&config_for(server.url()))
            .translate("hello", "en", "hi")
            .await
            .unwrap_err();

        assert!(matches!(err, TranslateError::Status(503)));
    }

    #[tokio::test]
    async fn malformed_body_is_a_parse_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/translate")
            .with_status(200)
            .with_body("<html>rate limited</html>")
            .create_async()
            .await;

        let err = LibreTranslator::from_config(&config_for(server.url()))
            .translate("hello", "en", "hi")
            .await
            .unwrap_err();

        assert!(matches!(err, TranslateError::Parse(_)));
    }

    #[tokio::test]
    async fn missing_or_blank_translation_is_empty() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/translate")
            .with_status(200)
            .with_body(r#"{"translatedText":"   "}"#)
            .create_async()
            .await;

        let err = LibreTranslator::from_config(&config_for(server.url()))
            .translate("hello", "en", "hi")
            .await
            .unwrap_err();

        assert!(matches!(err, TranslateError::Empty));
    }

    #[test]
    fn translator_is_object_safe() {
        let t: Box<dyn Translator> =
            Box::new(LibreTranslator::from_config(&TranslationConfig::default()));
        drop(t);
    }
}
