//! Language resolution and failure-tolerant translation

use std::sync::Arc;
use std::time::Duration;

use crate::config::TranslationConfig;
use crate::error::{Error, Result};
use crate::providers::TranslationProvider;

/// Code of the language documents are queried in
pub const BASE_LANGUAGE: &str = "en";

/// Supported interaction languages by display name
const LANGUAGES: [(&str, &str); 5] = [
    ("English", "en"),
    ("Hindi", "hi"),
    ("Odia", "or"),
    ("Bengali", "bn"),
    ("Tamil", "ta"),
];

/// Look up the code for a language display name
pub fn language_code(name: &str) -> Option<&'static str> {
    LANGUAGES
        .iter()
        .find(|(display, _)| *display == name)
        .map(|(_, code)| *code)
}

/// Resolve a language name, falling back to English for unknown names
/// unless `reject_unknown` is set
pub fn resolve_language(name: &str, reject_unknown: bool) -> Result<&'static str> {
    match language_code(name) {
        Some(code) => Ok(code),
        None if reject_unknown => Err(Error::validation(format!("Unsupported language: {}", name))),
        None => {
            tracing::warn!("Unknown language {:?}, falling back to English", name);
            Ok(BASE_LANGUAGE)
        }
    }
}

/// Translation with bounded retries that never fails the caller
pub struct Translator {
    provider: Arc<dyn TranslationProvider>,
    max_retries: u32,
    retry_delay: Duration,
}

impl Translator {
    /// Create a translator over a backend
    pub fn new(provider: Arc<dyn TranslationProvider>, config: &TranslationConfig) -> Self {
        Self {
            provider,
            max_retries: config.max_retries.max(1),
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        }
    }

    /// Translate `text`, returning `(text, succeeded)`.
    ///
    /// Same-language requests return the input without calling the backend.
    /// After all attempts fail, the original text comes back with `false`.
    pub async fn safe_translate(&self, text: &str, source: &str, target: &str) -> (String, bool) {
        if source == target {
            return (text.to_string(), true);
        }

        for attempt in 1..=self.max_retries {
            match self.provider.translate(text, source, target).await {
                Ok(translated) if !translated.is_empty() => return (translated, true),
                Ok(_) => tracing::warn!(
                    "Empty translation {}->{} (attempt {}/{})",
                    source,
                    target,
                    attempt,
                    self.max_retries
                ),
                Err(e) => tracing::warn!(
                    "Translation {}->{} failed (attempt {}/{}): {}",
                    source,
                    target,
                    attempt,
                    self.max_retries,
                    e
                ),
            }

            if attempt < self.max_retries {
                tokio::time::sleep(self.retry_delay).await;
            }
        }

        (text.to_string(), false)
    }
}
