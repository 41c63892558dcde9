//! Language registry — the closed set of conversation languages.
//!
//! Every language the assistant offers in its selector maps a short code
//! (`"hi"`) to the locale tag (`"hi-IN"`) that the speech capabilities expect,
//! plus the native label shown to the farmer.
//!
//! The table is a `static` slice: immutable, process-wide, and lock-free.
//! Lookups for an unknown code never fail — [`locale_tag`] falls back to
//! [`DEFAULT_LOCALE_TAG`].
//!
//! ```
//! use kisan_assistant::language::{locale_tag, DEFAULT_LOCALE_TAG};
//!
//! assert_eq!(locale_tag("kn"), "kn-IN");
//! assert_eq!(locale_tag("xx"), DEFAULT_LOCALE_TAG);
//! ```

// ---------------------------------------------------------------------------
// LanguageEntry
// ---------------------------------------------------------------------------

/// One selectable conversation language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageEntry {
    /// Short code used by the translation service (e.g. `"ta"`).
    pub code: &'static str,
    /// Locale tag handed to speech capture / synthesis (e.g. `"ta-IN"`).
    pub locale_tag: &'static str,
    /// Label shown in the language selector.
    pub label: &'static str,
}

/// Locale tag used when a code is not in [`LANGUAGES`].
pub const DEFAULT_LOCALE_TAG: &str = "en-IN";

/// Code of the language selected when nothing else is configured.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Supported languages, in selector order.
pub static LANGUAGES: &[LanguageEntry] = &[
    LanguageEntry { code: "en", locale_tag: "en-IN", label: "English" },
    LanguageEntry { code: "hi", locale_tag: "hi-IN", label: "हिंदी (Hindi)" },
    LanguageEntry { code: "kn", locale_tag: "kn-IN", label: "ಕನ್ನಡ (Kannada)" },
    LanguageEntry { code: "ta", locale_tag: "ta-IN", label: "தமிழ் (Tamil)" },
    LanguageEntry { code: "te", locale_tag: "te-IN", label: "తెలుగు (Telugu)" },
    LanguageEntry { code: "mr", locale_tag: "mr-IN", label: "मराठी (Marathi)" },
    LanguageEntry { code: "bn", locale_tag: "bn-IN", label: "বাংলা (Bengali)" },
];

// ---------------------------------------------------------------------------
// Lookups
// ---------------------------------------------------------------------------

/// Find the registry entry for `code`, if it is a supported language.
pub fn lookup(code: &str) -> Option<&'static LanguageEntry> {
    LANGUAGES.iter().find(|entry| entry.code == code)
}

/// Returns `true` when `code` is one of the supported languages.
pub fn is_supported(code: &str) -> bool {
    lookup(code).is_some()
}

/// Resolve the locale tag for `code`, falling back to [`DEFAULT_LOCALE_TAG`].
pub fn locale_tag(code: &str) -> &'static str {
    lookup(code).map_or(DEFAULT_LOCALE_TAG, |entry| entry.locale_tag)
}

/// Primary language subtag of a locale tag: `"hi-IN"` → `"hi"`.
///
/// Speech engines that only understand bare ISO-639-1 codes (Whisper,
/// espeak voices) use this.
pub fn primary_subtag(locale_tag: &str) -> &str {
    locale_tag.split(['-', '_']).next().unwrap_or(locale_tag)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
