//! Builds a ready-to-query pipeline from raw source bytes

use bytes::Bytes;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::{RagConfig, RetrievalConfig, VectorDbConfig};
use crate::error::{Error, Result};
use crate::ingestion::{DocumentLoader, RecursiveTextSplitter};
use crate::providers::{EmbeddingProvider, LlmProvider, LocalVectorStore, VectorStoreProvider};
use crate::retrieval::MultiQueryRetriever;
use crate::types::{FileType, SourceSummary};

use super::RagPipeline;

/// An uploaded or downloaded file awaiting ingestion
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Declared file type
    pub file_type: FileType,
    /// Raw bytes
    pub data: Bytes,
    /// Upload filename or download URL
    pub origin: String,
}

impl SourceFile {
    /// Create a source file
    pub fn new(file_type: FileType, data: impl Into<Bytes>, origin: impl Into<String>) -> Self {
        Self {
            file_type,
            data: data.into(),
            origin: origin.into(),
        }
    }
}

/// Load, split, embed, persist, and wire up retrieval for one source
pub struct PipelineBuilder {
    embedder: Arc<dyn EmbeddingProvider>,
    llm: Arc<dyn LlmProvider>,
    splitter: RecursiveTextSplitter,
    vector_db: VectorDbConfig,
    retrieval: RetrievalConfig,
}

impl PipelineBuilder {
    /// Create a builder sharing the given providers
    pub fn new(config: &RagConfig, embedder: Arc<dyn EmbeddingProvider>, llm: Arc<dyn LlmProvider>) -> Self {
        Self {
            embedder,
            llm,
            splitter: RecursiveTextSplitter::from_config(&config.chunking),
            vector_db: config.vector_db.clone(),
            retrieval: config.retrieval.clone(),
        }
    }

    /// Vector index location
    pub fn vector_db(&self) -> &VectorDbConfig {
        &self.vector_db
    }

    /// Build a pipeline over `source`
    pub async fn build(&self, source: SourceFile) -> Result<RagPipeline> {
        let SourceFile { file_type, data, origin } = source;
        let content_hash = hex::encode(Sha256::digest(&data));

        let documents = {
            let data = data.clone();
            tokio::task::spawn_blocking(move || DocumentLoader::load(file_type, &data))
                .await
                .map_err(|e| Error::Internal(format!("Task join error: {}", e)))??
        };

        if documents.is_empty() {
            return Err(Error::EmptyDocument(file_type.display_name().to_string()));
        }

        let mut chunks = self.splitter.split_documents(&documents);
        if chunks.is_empty() {
            return Err(Error::EmptyDocument(file_type.display_name().to_string()));
        }

        tracing::info!(
            "Split {} document(s) into {} chunk(s)",
            documents.len(),
            chunks.len()
        );

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(Error::embedding(format!(
                "Expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }
        for (chunk, embedding) in chunks.iter_mut().zip(embeddings) {
            chunk.embedding = embedding;
        }

        let build_id = Uuid::new_v4();
        let store = LocalVectorStore::create(&self.vector_db, build_id, self.embedder.dimensions()).await?;

        let indexed = async {
            store.insert_chunks(&chunks).await?;
            store.persist().await
        }
        .await;

        if let Err(e) = indexed {
            if let Err(cleanup) = tokio::fs::remove_dir_all(store.inner().dir()).await {
                tracing::warn!("Failed to remove incomplete index generation: {}", cleanup);
            }
            return Err(e);
        }

        let summary = SourceSummary {
            build_id,
            file_type,
            origin,
            content_hash,
            document_count: documents.len(),
            chunk_count: chunks.len(),
            ingested_at: chrono::Utc::now(),
        };

        let retriever = MultiQueryRetriever::new(
            Arc::clone(&self.llm),
            Arc::clone(&self.embedder),
            Arc::new(store),
            self.retrieval.query_variants,
            self.retrieval.top_k,
        );

        tracing::info!(
            "Built pipeline {} for {} ({} chunks)",
            summary.build_id,
            summary.origin,
            summary.chunk_count
        );

        Ok(RagPipeline::new(retriever, Arc::clone(&self.llm), summary))
    }
}
