//! Multilingual farmer advisory chat core.
//!
//! A farmer asks a question in their own language; the question is
//! translated into the backend's pivot language, answered by the advisory
//! backend, translated back, appended to the conversation and optionally
//! spoken aloud.
//!
//! * [`conversation`] — message log, turn state machine and [`Orchestrator`](conversation::Orchestrator).
//! * [`translate`] — LibreTranslate client and the failure-tolerant gateway.
//! * [`backend`] — advisory backend HTTP client.
//! * [`speech`] — voice capture and speech synthesis bridges.
//! * [`language`] — supported languages and their locale tags.
//! * [`config`] — TOML settings and platform paths.
//! * [`app`] — terminal chat front-end.

pub mod app;
pub mod backend;
pub mod config;
pub mod conversation;
pub mod language;
pub mod speech;
pub mod translate;
