//! LLM provider trait for text completion

use async_trait::async_trait;

use crate::error::Result;

/// Trait for prompt-in, text-out LLM completion
///
/// Implementations:
/// - `GroqLlm`: Groq OpenAI-compatible chat completions (mistral-saba-24b)
/// - `OllamaLlm`: local Ollama server
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Complete a prompt, returning the raw model output
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
