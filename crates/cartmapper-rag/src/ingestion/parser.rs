//! PDF and CSV loaders producing one document per page or row

use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::error::{Error, Result};
use crate::types::{Document, DocumentOrigin, FileType};

/// Turns raw upload bytes into an ordered sequence of documents
pub struct DocumentLoader;

impl DocumentLoader {
    /// Load a file of the given type
    pub fn load(file_type: FileType, data: &[u8]) -> Result<Vec<Document>> {
        let documents = match file_type {
            FileType::Pdf => Self::load_pdf(data)?,
            FileType::Csv => Self::load_csv(data)?,
        };

        tracing::info!(
            "Loaded {} document(s) from {} ({} bytes)",
            documents.len(),
            file_type.display_name(),
            data.len()
        );

        Ok(documents)
    }

    /// Load a PDF, one document per page with extractable text
    pub fn load_pdf(data: &[u8]) -> Result<Vec<Document>> {
        let pdf = lopdf::Document::load_mem(data)
            .map_err(|e| Error::MalformedPdf(e.to_string()))?;

        let pages = pdf.get_pages();
        let mut documents = Vec::with_capacity(pages.len());

        for &page_number in pages.keys() {
            match pdf.extract_text(&[page_number]) {
                Ok(text) => {
                    let text = cleanup_pdf_text(&text);
                    if text.trim().is_empty() {
                        tracing::debug!("Page {} has no extractable text, skipping", page_number);
                        continue;
                    }
                    documents.push(Document::new(text, DocumentOrigin::Page(page_number)));
                }
                Err(e) => {
                    tracing::warn!("Could not extract text from page {}: {}", page_number, e);
                }
            }
        }

        if documents.is_empty() && !pages.is_empty() {
            if let Some(text) = Self::extract_whole_pdf(data) {
                tracing::info!("Page extraction found no text, using whole-document fallback");
                documents.push(Document::new(text, DocumentOrigin::Whole));
            }
        }

        Ok(documents)
    }

    /// Whole-document extraction with pdf-extract, which copes with some
    /// font encodings lopdf cannot map. pdf-extract can panic on unusual
    /// fonts, so the call is isolated.
    fn extract_whole_pdf(data: &[u8]) -> Option<String> {
        let result = catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(data)));

        match result {
            Ok(Ok(text)) => {
                let text = cleanup_pdf_text(&text);
                (!text.trim().is_empty()).then_some(text)
            }
            Ok(Err(e)) => {
                tracing::warn!("pdf-extract fallback failed: {}", e);
                None
            }
            Err(_) => {
                tracing::warn!("pdf-extract fallback panicked");
                None
            }
        }
    }

    /// Load a CSV, one document per data row.
    ///
    /// Each document lists `column: value` for every column in header order.
    /// Rows shorter than the header leave the missing cells empty; rows
    /// longer than the header are malformed.
    pub fn load_csv(data: &[u8]) -> Result<Vec<Document>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(data);

        let headers = reader
            .headers()
            .map_err(|e| Error::MalformedCsv(e.to_string()))?
            .clone();

        let mut documents = Vec::new();

        for (index, record) in reader.records().enumerate() {
            let record = record.map_err(|e| Error::MalformedCsv(e.to_string()))?;
            if record.len() > headers.len() {
                return Err(Error::MalformedCsv(format!(
                    "row {} has {} fields, but the header has {}",
                    index + 1,
                    record.len(),
                    headers.len()
                )));
            }

            let content = headers
                .iter()
                .enumerate()
                .map(|(i, column)| format!("{}: {}", column, record.get(i).unwrap_or("")))
                .collect::<Vec<_>>()
                .join("\n");

            documents.push(Document::new(content, DocumentOrigin::Row(index as u32 + 1)));
        }

        Ok(documents)
    }
}

/// Strip NULs and trailing whitespace left by PDF text extraction
fn cleanup_pdf_text(text: &str) -> String {
    text.replace('\0', "")
        .replace('\u{00A0}', " ")
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
