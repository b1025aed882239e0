//! Recursive, separator-aware text splitting with overlap

use std::collections::VecDeque;

use crate::config::ChunkingConfig;
use crate::types::{Chunk, Document};

/// Separators tried in order: paragraphs, lines, words, characters
const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Splits text into chunks of at most `chunk_size` characters, with
/// `overlap` characters carried between consecutive chunks.
///
/// Text is split on the coarsest separator present; any piece still too
/// large is split again with the next separator. Small pieces are merged
/// back up to the size limit. Separators stay attached to the start of the
/// piece that follows them.
pub struct RecursiveTextSplitter {
    /// Maximum chunk size in characters
    chunk_size: usize,
    /// Overlap between chunks in characters
    overlap: usize,
    /// Separators, coarsest first; "" means split into characters
    separators: Vec<String>,
}

impl RecursiveTextSplitter {
    /// Create a new splitter with the default separators
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        Self {
            chunk_size,
            overlap,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Create from configuration
    pub fn from_config(config: &ChunkingConfig) -> Self {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    /// Split every document, keeping document order
    pub fn split_documents(&self, documents: &[Document]) -> Vec<Chunk> {
        let mut chunks = Vec::new();

        for (document_index, doc) in documents.iter().enumerate() {
            for (chunk_index, text) in self.split_text(doc.content()).into_iter().enumerate() {
                chunks.push(Chunk::new(document_index, doc.origin(), chunk_index as u32, text));
            }
        }

        chunks
    }

    /// Split a single text
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &self.separators)
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        let mut separator = separators.last().map(String::as_str).unwrap_or("");
        let mut remaining: &[String] = &[];

        for (i, candidate) in separators.iter().enumerate() {
            if candidate.is_empty() {
                separator = "";
                break;
            }
            if text.contains(candidate.as_str()) {
                separator = candidate;
                remaining = &separators[i + 1..];
                break;
            }
        }

        let mut chunks = Vec::new();
        let mut small = Vec::new();

        for piece in split_keeping_separator(text, separator) {
            if char_len(&piece) < self.chunk_size {
                small.push(piece);
                continue;
            }

            if !small.is_empty() {
                chunks.extend(self.merge_splits(std::mem::take(&mut small)));
            }

            if remaining.is_empty() {
                chunks.push(piece);
            } else {
                chunks.extend(self.split_recursive(&piece, remaining));
            }
        }

        if !small.is_empty() {
            chunks.extend(self.merge_splits(small));
        }

        chunks
    }

    /// Greedily join pieces up to `chunk_size`, rolling `overlap` characters
    /// of trailing pieces into the next chunk.
    fn merge_splits(&self, pieces: Vec<String>) -> Vec<String> {
        let mut merged = Vec::new();
        let mut window: VecDeque<(String, usize)> = VecDeque::new();
        let mut total = 0usize;

        for piece in pieces {
            let len = char_len(&piece);

            if total + len > self.chunk_size && !window.is_empty() {
                if total > self.chunk_size {
                    tracing::warn!(
                        "Created a chunk of size {}, which is longer than the specified {}",
                        total,
                        self.chunk_size
                    );
                }

                push_joined(&mut merged, &window);

                while total > self.overlap || (total + len > self.chunk_size && total > 0) {
                    match window.pop_front() {
                        Some((_, front_len)) => total -= front_len,
                        None => break,
                    }
                }
            }

            total += len;
            window.push_back((piece, len));
        }

        push_joined(&mut merged, &window);
        merged
    }
}

fn push_joined(merged: &mut Vec<String>, window: &VecDeque<(String, usize)>) {
    let joined: String = window.iter().map(|(piece, _)| piece.as_str()).collect();
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        merged.push(trimmed.to_string());
    }
}

/// Split on `separator`, attaching each separator to the following piece
fn split_keeping_separator(text: &str, separator: &str) -> Vec<String> {
    if separator.is_empty() {
        return text.chars().map(String::from).collect();
    }

    let mut parts = text.split(separator);
    let mut pieces = Vec::new();

    if let Some(first) = parts.next() {
        pieces.push(first.to_string());
    }
    pieces.extend(parts.map(|part| format!("{}{}", separator, part)));
    pieces.retain(|piece| !piece.is_empty());
    pieces
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}
