//! Groq LLM provider

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::LlmConfig;
use crate::error::Result;
use crate::generation::GroqClient;

use super::llm::LlmProvider;

/// Groq-hosted chat model
pub struct GroqLlm {
    client: Arc<GroqClient>,
}

impl GroqLlm {
    /// Create a new Groq LLM provider
    pub fn new(config: &LlmConfig) -> Result<Self> {
        Ok(Self {
            client: Arc::new(GroqClient::new(config)?),
        })
    }
}

#[async_trait]
impl LlmProvider for GroqLlm {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.client.complete(prompt).await
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check().await
    }

    fn name(&self) -> &str {
        "groq"
    }

    fn model(&self) -> &str {
        self.client.model()
    }
}
