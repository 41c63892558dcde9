//! `AdvisoryBackend` trait and the `HttpBackend` client.
//!
//! The advisory backend answers one pivot-language question at a time:
//! `POST {base_url}/api/ask` with `{ query }` → `{ answer }`. It also
//! exposes `GET {base_url}/health` for a startup reachability check.
//!
//! Dispatch is a single attempt; callers that want retry or backoff layer it
//! on top of the trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::BackendConfig;

/// Substituted when the backend replies without an `answer`.
pub const NO_ANSWER: &str = "Sorry, I could not find an answer.";

// ---------------------------------------------------------------------------
// BackendError
// ---------------------------------------------------------------------------

/// Ways the backend can be unavailable.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP transport or connection error.
    #[error("backend request failed: {0}")]
    Request(String),

    /// No reply within the configured timeout.
    #[error("backend request timed out")]
    Timeout,

    /// The backend answered with a non-success status.
    #[error("backend returned HTTP {0}")]
    Status(u16),

    /// The reply body was not JSON.
    #[error("failed to parse backend response: {0}")]
    Parse(String),

    /// The question was empty after trimming.
    #[error("refusing to dispatch an empty question")]
    EmptyQuestion,
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            BackendError::Timeout
        } else {
            BackendError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// AdvisoryBackend trait
// ---------------------------------------------------------------------------

/// Knowledge-answering backend.
#[async_trait]
pub trait AdvisoryBackend: Send + Sync {
    /// Ask `question` (pivot language) and return the free-text answer.
    async fn ask(&self, question: &str) -> Result<String, BackendError>;
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct AskRequest<'a> {
    query: &'a str,
}

#[derive(Debug, Deserialize)]
struct AskResponse {
    answer: Option<String>,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub message: String,
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

// ---------------------------------------------------------------------------
// HttpBackend
// ---------------------------------------------------------------------------

/// HTTP client for the advisory backend.
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    /// Build a client from config; the timeout applies per request.
    pub fn from_config(config: &BackendConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Probe `GET /health`.
    pub async fn health(&self) -> Result<HealthStatus, BackendError> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status(status.as_u16()));
        }

        response
            .json()
            .await
            .map_err(|e| BackendError::Parse(e.to_string()))
    }
}

#[async_trait]
impl AdvisoryBackend for HttpBackend {
    async fn ask(&self, question: &str) -> Result<String, BackendError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(BackendError::EmptyQuestion);
        }

        let response = self
            .client
            .post(format!("{}/api/ask", self.base_url))
            .json(&AskRequest { query: question })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status(status.as_u16()));
        }

        let parsed: AskResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Parse(e.to_string()))?;

        let answer = parsed
            .answer
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| NO_ANSWER.to_string());

        Ok(answer)
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

    fn backend_for(url: String) -> HttpBackend {
        HttpBackend::from_config(&BackendConfig {
            base_url: url,
            timeout_secs: 5,
        })
    }

    #[tokio::test]
    async fn ask_posts_query_and_returns_answer() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/ask")
            .match_body(Matcher::Json(json!({ "query": "How much water does wheat need?" })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"answer":"Wheat needs about 450-650mm over its cycle."}"#)
            .create_async()
            .await;

        let answer = backend_for(server.url())
            .ask("How much water does wheat need?")
            .await
            .unwrap();

        assert_eq!(answer, "Wheat needs about 450-650mm over its cycle.");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn missing_answer_field_substitutes_no_answer() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/ask")
            .with_status(200)
            .with_body(r#"{"detail":"nothing here"}"#)
            .create_async()
            .await;

        let answer = backend_for(server.url()).ask("soil pH?").await.unwrap();
        assert_eq!(answer, NO_ANSWER);
    }

    #[tokio::test]
    async fn blank_answer_substitutes_no_answer() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/ask")
            .with_status(200)
            .with_body(r#"{"answer":""}"#)
            .create_async()
            .await;

        let answer = backend_for(server.url()).ask("soil pH?").await.unwrap();
        assert_eq!(answer, NO_ANSWER);
    }

    #[tokio::test]
    async fn server_error_is_unavailable() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/ask")
            .with_status(500)
            .create_async()
            .await;

        let err = backend_for(server.url()).ask("soil pH?").await.unwrap_err();
        assert!(matches!(err, BackendError::Status(500)));
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_request_error() {
        // Port 9 (discard) on localhost is closed in test environments.
        let err = backend_for("http://127.0.0.1:9".into())
            .ask("soil pH?")
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Request(_) | BackendError::Timeout));
    }

    #[tokio::test]
    async fn empty_question_is_rejected_without_request() {
        let err = backend_for("http://127.0.0.1:9".into())
            .ask("   ")
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::EmptyQuestion));
    }

    #[tokio::test]
    async fn health_reads_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/health")
            .with_status(200)
            .with_body(r#"{"status":"ok","message":"Backend running ✅"}"#)
            .create_async()
            .await;

        let health = backend_for(server.url()).health().await.unwrap();
        assert!(health.is_ok());
        assert_eq!(health.message, "Backend running ✅");
    }
}
