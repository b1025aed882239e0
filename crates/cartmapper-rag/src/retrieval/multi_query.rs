//! Multi-query retrieval: search with several LLM paraphrases of a question

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::Result;
use crate::generation::PromptBuilder;
use crate::providers::{EmbeddingProvider, LlmProvider, VectorStoreProvider};
use crate::types::Chunk;

/// Retriever that broadens recall by searching each paraphrase independently
pub struct MultiQueryRetriever {
    llm: Arc<dyn LlmProvider>,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStoreProvider>,
    /// Paraphrases requested per question
    query_variants: usize,
    /// Nearest neighbours per paraphrase
    top_k: usize,
}

impl MultiQueryRetriever {
    /// Create a new retriever
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStoreProvider>,
        query_variants: usize,
        top_k: usize,
    ) -> Self {
        Self {
            llm,
            embedder,
            store,
            query_variants,
            top_k,
        }
    }

    /// Ask the LLM for paraphrases; falls back to the question itself
    pub async fn generate_queries(&self, question: &str) -> Result<Vec<String>> {
        let prompt = PromptBuilder::build_multi_query_prompt(question, self.query_variants);
        let output = self.llm.complete(&prompt).await?;

        let mut queries = PromptBuilder::parse_query_variants(&output);
        if queries.is_empty() {
            tracing::warn!("LLM produced no query variants, using the original question");
            queries.push(question.to_string());
        }

        tracing::info!("Generated queries: {:?}", queries);
        Ok(queries)
    }

    /// Retrieve the union of chunks for all variants, first-seen order, no duplicates
    pub async fn retrieve(&self, question: &str) -> Result<Vec<Chunk>> {
        let queries = self.generate_queries(question).await?;
        let embeddings = self.embedder.embed_batch(&queries).await?;

        let mut seen = HashSet::new();
        let mut chunks = Vec::new();

        for embedding in &embeddings {
            for result in self.store.search(embedding, self.top_k).await? {
                if seen.insert(result.chunk.id) {
                    chunks.push(result.chunk);
                }
            }
        }

        tracing::debug!(
            "Retrieved {} unique chunks across {} queries",
            chunks.len(),
            queries.len()
        );

        Ok(chunks)
    }
}
