//! Error types for the CartMapper backend

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for CartMapper operations
pub type Result<T> = std::result::Result<T, Error>;

/// Backend errors.
///
/// Variants above `Llm` are client-facing validation failures and map to
/// 400; everything else is reported as an internal server error.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Request failed validation
    #[error("{0}")]
    Validation(String),

    /// Upload declared a file type other than pdf/csv
    #[error("Invalid file type. Only PDF and CSV files are allowed.")]
    InvalidFileType(String),

    /// PDF byte stream could not be parsed at all
    #[error("Failed to process the PDF: {0}")]
    MalformedPdf(String),

    /// CSV could not be read
    #[error("Failed to process the CSV file: {0}")]
    MalformedCsv(String),

    /// Source produced zero documents
    #[error("No extractable text found in the {0}")]
    EmptyDocument(String),

    /// Pipeline construction failed; the previous pipeline stays active
    #[error("Failed to setup RAG chain: {0}")]
    PipelineBuild(String),

    /// Query issued before any document was ingested
    #[error("No document processed yet")]
    NoPipeline,

    /// Image decoded but contained no QR code
    #[error("No QR code found")]
    NoQrCode,

    /// QR payload is not an http(s) URL
    #[error("QR code does not contain a valid URL")]
    InvalidQrUrl,

    /// Image bytes or URL could not be turned into an image
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    /// Remote download failed or returned unexpected content
    #[error("An error occurred while downloading the PDF: {0}")]
    Download(String),

    /// LLM error
    #[error("LLM error: {0}")]
    Llm(String),

    /// Embedding error
    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    /// Vector index error
    #[error("Vector index error: {0}")]
    VectorDb(String),

    /// Translation backend error (never surfaced to clients directly)
    #[error("Translation error: {0}")]
    Translation(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Create a vector db error
    pub fn vector_db(message: impl Into<String>) -> Self {
        Self::VectorDb(message.into())
    }

    /// Create an LLM error
    pub fn llm(message: impl Into<String>) -> Self {
        Self::Llm(message.into())
    }

    /// Create a download error
    pub fn download(message: impl Into<String>) -> Self {
        Self::Download(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether this error is the client's fault (HTTP 400)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::Validation(_)
                | Error::InvalidFileType(_)
                | Error::MalformedPdf(_)
                | Error::MalformedCsv(_)
                | Error::EmptyDocument(_)
                | Error::PipelineBuild(_)
                | Error::NoPipeline
                | Error::NoQrCode
                | Error::InvalidQrUrl
                | Error::InvalidImage(_)
                | Error::Download(_)
        )
    }

    /// Wrap a construction-time failure so the upload endpoints report it as 400.
    ///
    /// Client errors raised while loading are passed through unchanged.
    pub fn into_build_error(self) -> Self {
        if self.is_client_error() {
            self
        } else {
            Error::PipelineBuild(self.to_string())
        }
    }

    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let detail = if status == StatusCode::BAD_REQUEST {
            self.to_string()
        } else {
            tracing::error!("Request failed: {}", self);
            format!("Internal server error: {}", self)
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}
