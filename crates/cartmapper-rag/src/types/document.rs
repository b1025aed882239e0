//! Document and chunk types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Supported source file types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// PDF document, one document per page
    Pdf,
    /// CSV file, one document per data row
    Csv,
}

impl FileType {
    /// Parse the `file_type` form value sent with uploads
    pub fn from_form_value(value: &str) -> Result<Self> {
        match value {
            "pdf" => Ok(Self::Pdf),
            "csv" => Ok(Self::Csv),
            other => Err(Error::InvalidFileType(other.to_string())),
        }
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Csv => "CSV",
        }
    }
}

/// Where a document came from inside its source file
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "number", rename_all = "lowercase")]
pub enum DocumentOrigin {
    /// 1-indexed PDF page
    Page(u32),
    /// 1-indexed CSV data row (header excluded)
    Row(u32),
    /// Whole-file text when page-level extraction found nothing
    Whole,
}

/// One unit of source text: a PDF page or a CSV row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    content: String,
    origin: DocumentOrigin,
}

impl Document {
    /// Create a document
    pub fn new(content: impl Into<String>, origin: DocumentOrigin) -> Self {
        Self {
            content: content.into(),
            origin,
        }
    }

    /// Text content
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Page or row this document was read from
    pub fn origin(&self) -> DocumentOrigin {
        self.origin
    }
}

/// A bounded slice of document text stored in the vector index
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Unique chunk ID
    pub id: Uuid,
    /// Index of the source document in the loaded sequence
    pub document_index: usize,
    /// Origin of the source document
    pub origin: DocumentOrigin,
    /// Position of this chunk within its document
    pub chunk_index: u32,
    /// Chunk text
    pub content: String,
    /// Normalized embedding (empty until embedded)
    #[serde(default)]
    pub embedding: Vec<f32>,
}

impl Chunk {
    /// Create a chunk without an embedding
    pub fn new(document_index: usize, origin: DocumentOrigin, chunk_index: u32, content: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_index,
            origin,
            chunk_index,
            content,
            embedding: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_type_form_values() {
        assert_eq!(FileType::from_form_value("pdf").unwrap(), FileType::Pdf);
        assert_eq!(FileType::from_form_value("csv").unwrap(), FileType::Csv);
        assert!(matches!(
            FileType::from_form_value("PDF"),
            Err(Error::InvalidFileType(_))
        ));
        assert!(FileType::from_form_value("docx").is_err());
    }

    #[test]
    fn test_new_chunk_has_no_embedding() {
        let chunk = Chunk::new(0, DocumentOrigin::Page(1), 0, "héllo".to_string());
        assert!(chunk.embedding.is_empty());
        assert_ne!(chunk.id, Chunk::new(0, DocumentOrigin::Page(1), 0, "héllo".to_string()).id);
    }

    #[test]
    fn test_origin_serialization() {
        let json = serde_json::to_value(DocumentOrigin::Row(3)).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "row", "number": 3}));
    }
}
