//! Local vector store provider over the persisted HNSW collection
//!
//! Wraps the synchronous `VectorStore` and moves its work onto the blocking pool.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::VectorDbConfig;
use crate::error::{Error, Result};
use crate::retrieval::VectorStore;
use crate::types::Chunk;

use super::vector_store::{VectorSearchResult, VectorStoreProvider};

/// Local vector store backed by one collection generation
pub struct LocalVectorStore {
    store: Arc<VectorStore>,
}

impl LocalVectorStore {
    /// Create from existing VectorStore
    pub fn new(store: Arc<VectorStore>) -> Self {
        Self { store }
    }

    /// Create a fresh generation for a build
    pub async fn create(config: &VectorDbConfig, generation: Uuid, dimensions: usize) -> Result<Self> {
        let config = config.clone();
        let store = tokio::task::spawn_blocking(move || VectorStore::create(&config, generation, dimensions))
            .await
            .map_err(|e| Error::Internal(format!("Task join error: {}", e)))??;

        Ok(Self::new(Arc::new(store)))
    }

    /// Get underlying store for direct access
    pub fn inner(&self) -> &Arc<VectorStore> {
        &self.store
    }
}

#[async_trait]
impl VectorStoreProvider for LocalVectorStore {
    async fn insert_chunks(&self, chunks: &[Chunk]) -> Result<()> {
        let store = self.store.clone();
        let chunks = chunks.to_vec();
        tokio::task::spawn_blocking(move || {
            for chunk in &chunks {
                store.insert_chunk(chunk)?;
            }
            Ok(())
        })
        .await
        .map_err(|e| Error::Internal(format!("Task join error: {}", e)))?
    }

    async fn search(&self, query_embedding: &[f32], top_k: usize) -> Result<Vec<VectorSearchResult>> {
        let store = self.store.clone();
        let query = query_embedding.to_vec();

        tokio::task::spawn_blocking(move || {
            let results = store.search(&query, top_k)?;
            Ok(results
                .into_iter()
                .map(|r| VectorSearchResult {
                    chunk: r.chunk,
                    similarity: r.similarity,
                })
                .collect())
        })
        .await
        .map_err(|e| Error::Internal(format!("Task join error: {}", e)))?
    }

    async fn persist(&self) -> Result<()> {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || store.persist())
            .await
            .map_err(|e| Error::Internal(format!("Task join error: {}", e)))?
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.store.len())
    }

    fn name(&self) -> &str {
        "local-collection"
    }
}
