//! cartmapper-rag: question answering over a single uploaded document
//!
//! Ingests a PDF or CSV (uploaded directly, linked by URL, or found behind a
//! QR code), indexes it with local ONNX sentence embeddings, and answers
//! questions through multi-query retrieval and an LLM, translating queries
//! and answers for non-English users.

pub mod config;
pub mod embeddings;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod pipeline;
pub mod providers;
pub mod qr;
pub mod retrieval;
pub mod server;
pub mod service;
pub mod translation;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use pipeline::{PipelineRegistry, RagPipeline};
pub use types::{
    document::{Chunk, Document, FileType},
    query::QueryRequest,
    response::{QueryOutcome, QueryResponse},
};
