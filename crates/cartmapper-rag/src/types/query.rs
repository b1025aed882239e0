//! Request types for the HTTP API

use serde::{Deserialize, Serialize};

/// Body of `POST /api/query`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    /// The question to answer
    pub query: String,

    /// Interaction language name (default: "English")
    #[serde(default = "default_language")]
    pub language: String,

    /// Requested output modality; echoed back, does not alter behavior
    #[serde(default = "default_output_method")]
    pub output_method: String,
}

fn default_language() -> String {
    "English".to_string()
}

fn default_output_method() -> String {
    "Text Only".to_string()
}

impl QueryRequest {
    /// Create a new English text query
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            language: default_language(),
            output_method: default_output_method(),
        }
    }

    /// Set the interaction language
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }
}

/// Body of `POST /api/process-qr`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QrRequest {
    /// Image URL when `is_url`, base64 image bytes otherwise
    pub qr_data: String,
    /// Whether `qr_data` is a URL to fetch
    pub is_url: bool,
}

/// Body of `POST /api/process-pdf-url`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfUrlRequest {
    /// Direct link to a PDF
    pub pdf_url: String,
}
