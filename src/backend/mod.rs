//! Advisory backend dispatch.
//!
//! * [`AdvisoryBackend`] — async trait for knowledge-answering backends.
//! * [`HttpBackend`] — client for `POST /api/ask` and `GET /health`.
//! * [`BackendError`] — why a question could not be answered.

pub mod dispatcher;

pub use dispatcher::{AdvisoryBackend, BackendError, HealthStatus, HttpBackend, NO_ANSWER};
