//! Translation between the farmer's language and the backend's pivot language.
//!
//! * [`Translator`] — async trait implemented by translation backends.
//! * [`LibreTranslator`] — LibreTranslate-compatible REST client.
//! * [`TranslationGateway`] — same-language short-circuit, timeout, optional
//!   retry, and pass-through on failure.
//! * [`TranslateError`] — error variants reported by translators.

pub mod client;
pub mod gateway;

pub use client::{LibreTranslator, TranslateError, Translator};
pub use gateway::TranslationGateway;
