//! Translation provider trait

use async_trait::async_trait;

use crate::error::Result;

/// Trait for machine translation between language codes
///
/// Implementations:
/// - `GoogleTranslator`: public Google Translate web endpoint
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    /// Translate `text` from `source` to `target` (ISO 639-1 codes).
    ///
    /// An empty string means the backend produced no translation.
    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
