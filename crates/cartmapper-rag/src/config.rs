//! Configuration for the CartMapper backend

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Environment variable naming the TOML config file
pub const CONFIG_PATH_ENV: &str = "CARTMAPPER_CONFIG";

/// Config file looked up when `CARTMAPPER_CONFIG` is unset
pub const DEFAULT_CONFIG_FILE: &str = "cartmapper.toml";

/// Main backend configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Embedding configuration
    pub embeddings: EmbeddingConfig,
    /// Chunking configuration
    pub chunking: ChunkingConfig,
    /// LLM configuration
    pub llm: LlmConfig,
    /// Vector index configuration
    pub vector_db: VectorDbConfig,
    /// Retrieval configuration
    pub retrieval: RetrievalConfig,
    /// Translation configuration
    pub translation: TranslationConfig,
    /// Remote download configuration
    pub fetch: FetchConfig,
}

impl RagConfig {
    /// Load configuration: TOML file (if present), then `.env`, then environment overrides.
    pub fn load() -> Result<Self> {
        // Missing .env is fine
        let _ = dotenv::dotenv();

        let path = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));

        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else {
            tracing::info!("No config file at {}, using defaults", path.display());
            Self::default()
        };

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&raw)?;
        tracing::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse TOML text
    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::Config(format!("Invalid config: {}", e)))
    }

    /// Apply environment variable overrides
    pub fn apply_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Apply overrides from a variable lookup
    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(key) = var("GROQ_API_KEY") {
            if !key.trim().is_empty() {
                self.llm.api_key = Some(key);
            }
        }
        if let Some(host) = var("CARTMAPPER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = var("CARTMAPPER_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!("Ignoring invalid CARTMAPPER_PORT: {}", port),
            }
        }
        if let Some(provider) = var("CARTMAPPER_LLM_PROVIDER") {
            match provider.to_lowercase().as_str() {
                "groq" => self.llm.switch_provider(LlmBackend::Groq),
                "ollama" => self.llm.switch_provider(LlmBackend::Ollama),
                other => tracing::warn!("Ignoring unknown CARTMAPPER_LLM_PROVIDER: {}", other),
            }
        }
    }

    /// Validate cross-field requirements
    pub fn validate(&self) -> Result<()> {
        if self.llm.provider == LlmBackend::Groq && self.llm.api_key.is_none() {
            return Err(Error::Config(
                "GROQ_API_KEY environment variable is not set. Please set it in your .env file."
                    .to_string(),
            ));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(Error::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.translation.max_retries == 0 {
            return Err(Error::Config(
                "translation.max_retries must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Allowed CORS origins (empty = any)
    pub cors_origins: Vec<String>,
    /// Maximum upload size in bytes (default: 10MB)
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["http://localhost:3000".to_string()],
            max_upload_size: 10 * 1024 * 1024,
        }
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Sentence-transformers model name
    pub model: String,
    /// Embedding dimensions (384 for MiniLM)
    pub dimensions: usize,
    /// Batch size for embedding generation
    pub batch_size: usize,
    /// Maximum sequence length in tokens
    pub max_length: usize,
    /// Intra-op threads for ONNX Runtime
    pub threads: usize,
    /// Cache directory for model files
    pub cache_dir: PathBuf,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "all-MiniLM-L6-v2".to_string(),
            dimensions: 384,
            batch_size: 32,
            max_length: 256,
            threads: 4,
            cache_dir: dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("cartmapper")
                .join("models"),
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum chunk size in characters
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 3000,
            chunk_overlap: 200,
        }
    }
}

/// Which LLM backend answers questions
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LlmBackend {
    /// Groq OpenAI-compatible chat completions
    #[default]
    Groq,
    /// Local Ollama server
    Ollama,
}

impl LlmBackend {
    /// Default API base URL for this backend
    pub fn default_base_url(self) -> &'static str {
        match self {
            LlmBackend::Groq => "https://api.groq.com/openai/v1",
            LlmBackend::Ollama => "http://localhost:11434",
        }
    }

    /// Default generation model for this backend
    pub fn default_model(self) -> &'static str {
        match self {
            LlmBackend::Groq => "mistral-saba-24b",
            LlmBackend::Ollama => "llama3.2:3b",
        }
    }
}

/// LLM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Backend provider
    pub provider: LlmBackend,
    /// API base URL (Groq or Ollama)
    pub base_url: String,
    /// Generation model name
    pub model: String,
    /// API key (Groq only; usually from GROQ_API_KEY)
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Temperature for generation
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmBackend::Groq,
            base_url: LlmBackend::Groq.default_base_url().to_string(),
            model: LlmBackend::Groq.default_model().to_string(),
            api_key: None,
            temperature: 0.0,
            timeout_secs: 120,
        }
    }
}

impl LlmConfig {
    /// Change backend, moving `base_url` and `model` to the new backend's
    /// defaults unless they were customised
    pub fn switch_provider(&mut self, provider: LlmBackend) {
        if provider == self.provider {
            return;
        }
        if self.base_url == self.provider.default_base_url() {
            self.base_url = provider.default_base_url().to_string();
        }
        if self.model == self.provider.default_model() {
            self.model = provider.default_model().to_string();
        }
        self.provider = provider;
    }
}

/// Vector index configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorDbConfig {
    /// Directory holding the persisted collections
    pub storage_path: PathBuf,
    /// Collection name reused across builds
    pub collection_name: String,
    /// HNSW M parameter (max connections per node)
    pub hnsw_m: usize,
    /// HNSW ef_construction parameter
    pub hnsw_ef_construction: usize,
    /// HNSW ef_search parameter
    pub hnsw_ef_search: usize,
}

impl Default for VectorDbConfig {
    fn default() -> Self {
        Self {
            storage_path: PathBuf::from("./chroma_db"),
            collection_name: "huggingface-groq-rag".to_string(),
            hnsw_m: 32,
            hnsw_ef_construction: 200,
            hnsw_ef_search: 100,
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of paraphrases requested from the LLM
    pub query_variants: usize,
    /// Nearest neighbours fetched per variant
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            query_variants: 5,
            top_k: 4,
        }
    }
}

/// Translation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    /// Translation endpoint base URL
    pub base_url: String,
    /// Attempts per translation
    pub max_retries: u32,
    /// Delay between attempts in milliseconds
    pub retry_delay_ms: u64,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Reject unknown language names instead of falling back to English
    pub reject_unknown_languages: bool,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            base_url: "https://translate.googleapis.com".to_string(),
            max_retries: 2,
            retry_delay_ms: 1000,
            timeout_secs: 15,
            reject_unknown_languages: false,
        }
    }
}

/// Remote download configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Largest accepted download in bytes
    pub max_download_size: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            max_download_size: 50 * 1024 * 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_pipeline_constants() {
        let config = RagConfig::default();
        assert_eq!(config.chunking.chunk_size, 3000);
        assert_eq!(config.chunking.chunk_overlap, 200);
        assert_eq!(config.embeddings.dimensions, 384);
        assert_eq!(config.retrieval.query_variants, 5);
        assert_eq!(config.vector_db.collection_name, "huggingface-groq-rag");
        assert_eq!(config.translation.max_retries, 2);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = RagConfig::from_toml(
            r#"
            [server]
            port = 9000

            [llm]
            provider = "ollama"
            base_url = "http://localhost:11434"
            model = "llama3.2:3b"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.llm.provider, LlmBackend::Ollama);
        assert_eq!(config.chunking.chunk_size, 3000);
    }

    #[test]
    fn test_groq_requires_api_key() {
        let mut config = RagConfig::default();
        config.llm.api_key = None;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        config.llm.api_key = Some("gsk_test".to_string());
        assert!(config.validate().is_ok());

        config.llm.api_key = None;
        config.llm.provider = LlmBackend::Ollama;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overlap_must_be_smaller_than_chunk() {
        let mut config = RagConfig::default();
        config.llm.provider = LlmBackend::Ollama;
        config.chunking.chunk_overlap = 3000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_provider_override_moves_to_backend_defaults() {
        let mut config = RagConfig::default();
        config.apply_overrides(|name| match name {
            "CARTMAPPER_LLM_PROVIDER" => Some("Ollama".to_string()),
            _ => None,
        });

        assert_eq!(config.llm.provider, LlmBackend::Ollama);
        assert_eq!(config.llm.base_url, "http://localhost:11434");
        assert_eq!(config.llm.model, "llama3.2:3b");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_provider_override_keeps_custom_endpoint() {
        let mut config = RagConfig::from_toml(
            r#"
            [llm]
            base_url = "http://gpu-box:11434"
            "#,
        )
        .unwrap();
        config.apply_overrides(|name| match name {
            "CARTMAPPER_LLM_PROVIDER" => Some("ollama".to_string()),
            "CARTMAPPER_PORT" => Some("9100".to_string()),
            _ => None,
        });

        assert_eq!(config.llm.base_url, "http://gpu-box:11434");
        assert_eq!(config.llm.model, "llama3.2:3b");
        assert_eq!(config.server.port, 9100);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        assert!(matches!(
            RagConfig::from_toml("[server\nport = 1"),
            Err(Error::Config(_))
        ));
    }
}
