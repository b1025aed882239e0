//! Vector index and multi-query retrieval

pub mod multi_query;
pub mod search;

pub use multi_query::MultiQueryRetriever;
pub use search::{collection_dir, prune_generations, SearchResult, VectorStore};
