//! The retrieval + generation pipeline and its lifecycle

pub mod builder;
pub mod registry;

use std::sync::Arc;

pub use builder::{PipelineBuilder, SourceFile};
pub use registry::PipelineRegistry;

use crate::error::Result;
use crate::generation::PromptBuilder;
use crate::providers::LlmProvider;
use crate::retrieval::MultiQueryRetriever;
use crate::types::SourceSummary;

/// A built pipeline over one ingested source
pub struct RagPipeline {
    retriever: MultiQueryRetriever,
    llm: Arc<dyn LlmProvider>,
    summary: SourceSummary,
}

impl RagPipeline {
    /// Assemble a pipeline from its parts
    pub fn new(retriever: MultiQueryRetriever, llm: Arc<dyn LlmProvider>, summary: SourceSummary) -> Self {
        Self {
            retriever,
            llm,
            summary,
        }
    }

    /// Source this pipeline was built from
    pub fn summary(&self) -> &SourceSummary {
        &self.summary
    }

    /// Answer a question from the indexed source, returning raw LLM output
    pub async fn invoke(&self, question: &str) -> Result<String> {
        let chunks = self.retriever.retrieve(question).await?;
        let context = PromptBuilder::build_context(&chunks);
        let prompt = PromptBuilder::build_answer_prompt(question, &context);

        tracing::info!(
            "Answering with {} via {} ({} context chunks)",
            self.llm.model(),
            self.llm.name(),
            chunks.len()
        );

        self.llm.complete(&prompt).await
    }
}
