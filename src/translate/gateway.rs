//! Translation gateway — best-effort translation that never fails.
//!
//! [`TranslationGateway`] wraps any [`Translator`] and
//!
//! * short-circuits when source and target are the same language, without
//!   touching the service;
//! * bounds every call with a timeout;
//! * optionally retries a failed call once;
//! * on any remaining failure returns the original text unchanged.

use std::sync::Arc;
use std::time::Duration;

use super::client::{TranslateError, Translator};
use crate::config::TranslationConfig;

/// Best-effort wrapper around a [`Translator`].
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use kisan_assistant::config::TranslationConfig;
/// use kisan_assistant::translate::{LibreTranslator, TranslationGateway};
///
/// # async fn example() {
/// let config = TranslationConfig::default();
/// let gateway = TranslationGateway::from_config(
///     Arc::new(LibreTranslator::from_config(&config)),
///     &config,
/// );
/// // Always yields text, even when the service is down.
/// let text = gateway.translate("नमस्ते", "hi", "en").await;
/// # }
/// ```
#[derive(Clone)]
pub struct TranslationGateway {
    inner: Arc<dyn Translator>,
    timeout: Duration,
    retry_once: bool,
}

impl TranslationGateway {
    pub fn new(inner: Arc<dyn Translator>, timeout: Duration, retry_once: bool) -> Self {
        Self {
            inner,
            timeout,
            retry_once,
        }
    }

    pub fn from_config(inner: Arc<dyn Translator>, config: &TranslationConfig) -> Self {
        Self::new(inner, config.timeout(), config.retry_once)
    }

    /// Translate `text` from `source` to `target`, returning `text` unchanged
    /// when the languages match or the service fails.
    pub async fn translate(&self, text: &str, source: &str, target: &str) -> String {
        if source == target {
            return text.to_string();
        }

        match self.try_translate(text, source, target).await {
            Ok(translated) => translated,
            Err(err) => {
                log::warn!(
                    "translate: {source}→{target} degraded, passing text through (len={}): {err}",
                    text.len()
                );
                text.to_string()
            }
        }
    }

    /// Translate with failures reported instead of absorbed.
    ///
    /// Honours the timeout and retry settings, but not the same-language
    /// short-circuit.
    pub async fn try_translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, TranslateError> {
        let first = self.attempt(text, source, target).await;
        match first {
            Err(err) if self.retry_once => {
                log::debug!("translate: first attempt failed ({err}), retrying once");
                self.attempt(text, source, target).await
            }
            other => other,
        }
    }

    async fn attempt(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, TranslateError> {
        tokio::time::timeout(self.timeout, self.inner.translate(text, source, target))
            .await
            .map_err(|_| TranslateError::Timeout)?
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
