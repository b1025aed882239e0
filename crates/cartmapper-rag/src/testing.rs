//! Deterministic fakes for the provider traits

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{Error, Result};
use crate::providers::{EmbeddingProvider, LlmProvider, RemoteFetcher, TranslationProvider};

/// Bag-of-words embedder: each lowercase word hashes to one dimension
pub struct HashEmbedder {
    pub dimensions: usize,
    pub calls: AtomicUsize,
}

impl HashEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            calls: AtomicUsize::new(0),
        }
    }

    fn vector(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dimensions];
        for word in text.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
            let slot = word
                .to_lowercase()
                .bytes()
                .fold(7usize, |h, b| h.wrapping_mul(31).wrapping_add(b as usize))
                % self.dimensions;
            v[slot] += 1.0;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            v.iter_mut().for_each(|x| *x /= norm);
        }
        v
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| self.vector(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "hash"
    }
}

/// Embedder that always fails
pub struct FailingEmbedder;

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(Error::embedding("model unavailable"))
    }

    fn dimensions(&self) -> usize {
        8
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// LLM that answers query-expansion prompts with fixed variants and
/// answer prompts by echoing the prompt back
pub struct ScriptedLlm {
    pub variants: String,
    pub fail_answers: bool,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub fn new(variants: &str) -> Self {
        Self {
            variants: variants.to_string(),
            fail_answers: false,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_answers(variants: &str) -> Self {
        Self {
            fail_answers: true,
            ..Self::new(variants)
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().len()
    }

    pub fn answer_prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .iter()
            .filter(|p| p.starts_with("Answer the question"))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().push(prompt.to_string());
        if prompt.contains("different versions of the given question") {
            return Ok(self.variants.clone());
        }
        if self.fail_answers {
            return Err(Error::llm("upstream unavailable"));
        }
        Ok(format!("ECHO {}", prompt))
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-1"
    }
}

/// Translator that tags text with the target code
pub struct TaggingTranslator {
    pub calls: AtomicUsize,
}

impl TaggingTranslator {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl TranslationProvider for TaggingTranslator {
    async fn translate(&self, text: &str, _source: &str, target: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("[{}] {}", target, text))
    }

    fn name(&self) -> &str {
        "tagging"
    }
}

/// Translator that errors on every call
pub struct FailingTranslator {
    pub calls: AtomicUsize,
}

impl FailingTranslator {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl TranslationProvider for FailingTranslator {
    async fn translate(&self, _text: &str, _source: &str, _target: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(Error::Translation("service unavailable".to_string()))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Fetcher serving fixed bytes
pub struct StaticFetcher {
    pub image: Option<Bytes>,
    pub pdf: Option<Bytes>,
}

#[async_trait]
impl RemoteFetcher for StaticFetcher {
    async fn fetch_image(&self, _url: &str) -> Result<Bytes> {
        self.image
            .clone()
            .ok_or_else(|| Error::InvalidImage("not found".to_string()))
    }

    async fn download_pdf(&self, _url: &str) -> Result<Bytes> {
        self.pdf
            .clone()
            .ok_or_else(|| Error::download("Failed to download PDF. Status code: 404"))
    }
}
