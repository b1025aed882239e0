//! Provider abstractions for embeddings, LLM, vector storage, translation and downloads
//!
//! Each external collaborator sits behind a trait so the pipeline and the
//! HTTP layer can run against fakes in tests.

pub mod embedding;
pub mod fetch;
pub mod google_translate;
pub mod groq;
pub mod llm;
pub mod local;
pub mod ollama;
pub mod translation;
pub mod vector_store;

pub use embedding::EmbeddingProvider;
pub use fetch::{HttpFetcher, RemoteFetcher};
pub use google_translate::GoogleTranslator;
pub use groq::GroqLlm;
pub use llm::LlmProvider;
pub use local::LocalVectorStore;
pub use ollama::OllamaLlm;
pub use translation::TranslationProvider;
pub use vector_store::{VectorSearchResult, VectorStoreProvider};
