//! Core types for the backend

pub mod document;
pub mod query;
pub mod response;

pub use document::{Chunk, Document, DocumentOrigin, FileType};
pub use query::{PdfUrlRequest, QrRequest, QueryRequest};
pub use response::{QueryOutcome, QueryResponse, SourceSummary, TranslationWarning};
