//! Application state for the HTTP server

use std::sync::Arc;

use crate::config::{LlmBackend, RagConfig};
use crate::embeddings::OnnxEmbedder;
use crate::error::Result;
use crate::pipeline::{PipelineBuilder, PipelineRegistry};
use crate::providers::{
    EmbeddingProvider, GoogleTranslator, GroqLlm, HttpFetcher, LlmProvider, OllamaLlm,
    RemoteFetcher, TranslationProvider,
};
use crate::service::{IngestService, QueryService};
use crate::translation::Translator;

/// External collaborators the server runs against
pub struct Providers {
    /// Sentence embedder
    pub embedder: Arc<dyn EmbeddingProvider>,
    /// Completion model
    pub llm: Arc<dyn LlmProvider>,
    /// Translation backend
    pub translator: Arc<dyn TranslationProvider>,
    /// Remote downloader
    pub fetcher: Arc<dyn RemoteFetcher>,
}

impl Providers {
    /// Build the production providers from configuration
    pub async fn from_config(config: &RagConfig) -> Result<Self> {
        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(OnnxEmbedder::new(&config.embeddings).await?);

        let llm: Arc<dyn LlmProvider> = match config.llm.provider {
            LlmBackend::Groq => Arc::new(GroqLlm::new(&config.llm)?),
            LlmBackend::Ollama => Arc::new(OllamaLlm::new(&config.llm)?),
        };

        if llm.health_check().await? {
            tracing::info!("LLM provider ready: {} ({})", llm.name(), llm.model());
        } else {
            tracing::warn!(
                "LLM provider {} is not reachable at {}; queries will fail until it is",
                llm.name(),
                config.llm.base_url
            );
        }

        Ok(Self {
            embedder,
            llm,
            translator: Arc::new(GoogleTranslator::new(&config.translation)?),
            fetcher: Arc::new(HttpFetcher::new(&config.fetch)?),
        })
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: RagConfig,
    /// Active pipeline holder
    registry: Arc<PipelineRegistry>,
    /// Query orchestration
    query: QueryService,
    /// Ingestion orchestration
    ingest: IngestService,
}

impl AppState {
    /// Create application state with production providers
    pub async fn new(config: RagConfig) -> Result<Self> {
        tracing::info!("Initializing CartMapper application state (LLM: {:?})...", config.llm.provider);
        let providers = Providers::from_config(&config).await?;
        Ok(Self::from_parts(config, providers))
    }

    /// Create application state over the given providers
    pub fn from_parts(config: RagConfig, providers: Providers) -> Self {
        let Providers {
            embedder,
            llm,
            translator,
            fetcher,
        } = providers;

        let registry = Arc::new(PipelineRegistry::new(PipelineBuilder::new(&config, embedder, llm)));
        let query = QueryService::new(
            Arc::clone(&registry),
            Translator::new(translator, &config.translation),
            config.translation.reject_unknown_languages,
        );
        let ingest = IngestService::new(Arc::clone(&registry), fetcher);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                registry,
                query,
                ingest,
            }),
        }
    }

    /// Get configuration
    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    /// Get the pipeline registry
    pub fn registry(&self) -> &PipelineRegistry {
        &self.inner.registry
    }

    /// Get the query service
    pub fn query_service(&self) -> &QueryService {
        &self.inner.query
    }

    /// Get the ingest service
    pub fn ingest_service(&self) -> &IngestService {
        &self.inner.ingest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{HashEmbedder, ScriptedLlm, StaticFetcher, TaggingTranslator};

    #[test]
    fn test_state_starts_without_pipeline_and_keeps_config() {
        let mut config = RagConfig::default();
        config.server.port = 9123;

        let state = AppState::from_parts(
            config,
            Providers {
                embedder: Arc::new(HashEmbedder::new(16)),
                llm: Arc::new(ScriptedLlm::new("")),
                translator: Arc::new(TaggingTranslator::new()),
                fetcher: Arc::new(StaticFetcher { image: None, pdf: None }),
            },
        );

        assert_eq!(state.config().server.port, 9123);
        assert!(state.registry().current().is_none());
    }
}
