//! Response types for the HTTP API

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::document::FileType;

/// Successful answer from `POST /api/query`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryResponse {
    /// Answer text, in the interaction language when translation succeeded
    pub answer: String,
    /// Language name as sent by the client
    pub language: String,
    /// Output modality as sent by the client
    pub output_method: String,
}

/// Warning-only body returned when the question could not be translated
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranslationWarning {
    /// Human-readable warning
    pub warning: String,
}

impl TranslationWarning {
    /// Warning for a failed inbound translation
    pub fn query_translation_failed() -> Self {
        Self {
            warning: "Query translation failed, results may be less accurate".to_string(),
        }
    }
}

/// Outcome of a query: an answer or a translation warning
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum QueryOutcome {
    /// The pipeline answered
    Answered(QueryResponse),
    /// Inbound translation failed; the pipeline was not invoked
    Warning(TranslationWarning),
}

/// Plain message body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Human-readable message
    pub message: String,
}

/// Body of a successful `POST /api/process-qr`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QrResponse {
    /// Human-readable message
    pub message: String,
    /// URL decoded from the QR code
    pub qr_data: String,
}

/// Body of a successful `POST /api/process-pdf-url`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfUrlResponse {
    /// Human-readable message
    pub message: String,
    /// URL the PDF was downloaded from
    pub pdf_url: String,
}

/// Summary of the source behind the active pipeline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceSummary {
    /// Build that produced the pipeline
    pub build_id: Uuid,
    /// Source file type
    pub file_type: FileType,
    /// Upload filename or download URL
    pub origin: String,
    /// SHA-256 of the source bytes
    pub content_hash: String,
    /// Documents (pages or rows) loaded
    pub document_count: usize,
    /// Chunks indexed
    pub chunk_count: usize,
    /// Build completion time
    pub ingested_at: chrono::DateTime<chrono::Utc>,
}

/// Body of `GET /api/upload/list`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentListResponse {
    /// Zero or one entries
    pub documents: Vec<SourceSummary>,
}

/// Body of `GET /api/health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always "healthy"
    pub status: String,
    /// Service name
    pub service: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "healthy".to_string(),
            service: "CartMapper Backend".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_outcome_has_no_answer_field() {
        let outcome = QueryOutcome::Warning(TranslationWarning::query_translation_failed());
        let json = serde_json::to_value(&outcome).unwrap();
        assert!(json.get("answer").is_none());
        assert_eq!(
            json["warning"],
            "Query translation failed, results may be less accurate"
        );
    }

    #[test]
    fn test_answered_outcome_is_flat() {
        let outcome = QueryOutcome::Answered(QueryResponse {
            answer: "Apples cost 1.50".to_string(),
            language: "English".to_string(),
            output_method: "Text Only".to_string(),
        });
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["answer"], "Apples cost 1.50");
        assert_eq!(json["output_method"], "Text Only");
    }
}
