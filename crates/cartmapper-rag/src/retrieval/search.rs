//! Persisted chunk collection with HNSW nearest-neighbour search
//!
//! A collection lives under `<storage_path>/<collection_name>/`. Every build
//! writes a fresh generation directory named by its build id, so a new index
//! never mixes with embeddings from an earlier upload. Chunks and embeddings
//! are stored in a redb file inside the generation; the HNSW graph is held in
//! memory and rebuilt from that file when a generation is reopened.

use hnsw_rs::prelude::{DistL2, Hnsw};
use parking_lot::{Mutex, RwLock};
use redb::{Database, TableDefinition};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::config::VectorDbConfig;
use crate::error::{Error, Result};
use crate::types::Chunk;

/// redb file holding a generation's chunks and embeddings
pub const INDEX_FILE: &str = "index.redb";

/// Chunk id -> JSON-encoded chunk
const CHUNKS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("chunks");

/// HNSW layer cap
const MAX_LAYERS: usize = 16;

/// HNSW capacity hint
const MAX_ELEMENTS: usize = 100_000;

/// Search result with chunk and similarity
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The retrieved chunk
    pub chunk: Chunk,
    /// Cosine similarity (dot product of normalized vectors)
    pub similarity: f32,
}

/// One generation of the on-disk collection
pub struct VectorStore {
    /// Generation directory
    dir: PathBuf,
    /// Embedding dimensions
    dimensions: usize,
    /// HNSW ef_search parameter
    ef_search: usize,
    /// Durable chunk storage
    db: Database,
    /// Approximate nearest-neighbour graph keyed by slot
    index: Hnsw<'static, f32, DistL2>,
    /// Chunks by HNSW slot; a replaced chunk leaves its old slot stale
    slots: RwLock<Vec<Chunk>>,
    /// Chunk id to its live slot
    live: RwLock<HashMap<Uuid, usize>>,
    /// Chunk ids inserted since the last persist
    pending: Mutex<Vec<Uuid>>,
}

impl VectorStore {
    /// Create an empty generation for a build
    pub fn create(config: &VectorDbConfig, generation: Uuid, dimensions: usize) -> Result<Self> {
        let dir = collection_dir(config).join(generation.to_string());
        std::fs::create_dir_all(&dir)?;

        let db = Database::create(dir.join(INDEX_FILE)).map_err(db_error)?;
        let txn = db.begin_write().map_err(db_error)?;
        txn.open_table(CHUNKS_TABLE).map_err(db_error)?;
        txn.commit().map_err(db_error)?;

        Ok(Self::with_db(config, dir, db, dimensions))
    }

    /// Load a persisted generation and rebuild its graph
    #[cfg(test)]
    pub fn open(config: &VectorDbConfig, generation: Uuid, dimensions: usize) -> Result<Self> {
        use redb::ReadableTable;

        let dir = collection_dir(config).join(generation.to_string());
        let db = Database::open(dir.join(INDEX_FILE)).map_err(db_error)?;

        let mut chunks = Vec::new();
        {
            let txn = db.begin_read().map_err(db_error)?;
            let table = txn.open_table(CHUNKS_TABLE).map_err(db_error)?;
            for entry in table.iter().map_err(db_error)? {
                let (_, value) = entry.map_err(db_error)?;
                chunks.push(serde_json::from_slice::<Chunk>(value.value())?);
            }
        }

        let store = Self::with_db(config, dir, db, dimensions);
        for chunk in &chunks {
            store.index_chunk(chunk)?;
        }
        store.pending.lock().clear();
        Ok(store)
    }

    fn with_db(config: &VectorDbConfig, dir: PathBuf, db: Database, dimensions: usize) -> Self {
        let index = Hnsw::new(
            config.hnsw_m,
            MAX_ELEMENTS,
            MAX_LAYERS,
            config.hnsw_ef_construction,
            DistL2 {},
        );

        Self {
            dir,
            dimensions,
            ef_search: config.hnsw_ef_search,
            db,
            index,
            slots: RwLock::new(Vec::new()),
            live: RwLock::new(HashMap::new()),
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Generation directory on disk
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Insert a chunk, replacing any chunk with the same id
    pub fn insert_chunk(&self, chunk: &Chunk) -> Result<()> {
        if chunk.embedding.is_empty() {
            return Err(Error::vector_db("Chunk has no embedding"));
        }
        if chunk.embedding.len() != self.dimensions {
            return Err(Error::vector_db(format!(
                "Embedding has {} dimensions, expected {}",
                chunk.embedding.len(),
                self.dimensions
            )));
        }

        self.index_chunk(chunk)
    }

    fn index_chunk(&self, chunk: &Chunk) -> Result<()> {
        let mut slots = self.slots.write();
        let slot = slots.len();

        self.index.insert((&chunk.embedding, slot));
        slots.push(chunk.clone());
        self.live.write().insert(chunk.id, slot);
        self.pending.lock().push(chunk.id);

        Ok(())
    }

    /// Return the `top_k` chunks most similar to the query, best first
    pub fn search(&self, query_embedding: &[f32], top_k: usize) -> Result<Vec<SearchResult>> {
        if query_embedding.len() != self.dimensions {
            return Err(Error::vector_db(format!(
                "Query has {} dimensions, expected {}",
                query_embedding.len(),
                self.dimensions
            )));
        }

        let slots = self.slots.read();
        let live = self.live.read();
        if top_k == 0 || live.is_empty() {
            return Ok(Vec::new());
        }

        // Over-fetch by the number of stale slots so replaced chunks do not crowd out live ones
        let stale = slots.len() - live.len();
        let knbn = (top_k + stale).min(slots.len());
        let neighbours = self.index.search(query_embedding, knbn, self.ef_search.max(knbn));

        Ok(neighbours
            .into_iter()
            .filter_map(|n| {
                let chunk = slots.get(n.d_id)?;
                (live.get(&chunk.id) == Some(&n.d_id)).then(|| SearchResult {
                    chunk: chunk.clone(),
                    // Unit vectors: |a - b|^2 = 2 - 2 a.b
                    similarity: 1.0 - n.distance * n.distance / 2.0,
                })
            })
            .take(top_k)
            .collect())
    }

    /// Write chunks inserted since the last persist in one transaction
    pub fn persist(&self) -> Result<()> {
        let pending = std::mem::take(&mut *self.pending.lock());
        if pending.is_empty() {
            return Ok(());
        }

        if let Err(e) = self.write_chunks(&pending) {
            self.pending.lock().extend(pending);
            return Err(e);
        }

        tracing::debug!("Persisted {} chunks to {}", pending.len(), self.dir.display());
        Ok(())
    }

    fn write_chunks(&self, ids: &[Uuid]) -> Result<()> {
        let slots = self.slots.read();
        let live = self.live.read();

        let txn = self.db.begin_write().map_err(db_error)?;
        {
            let mut table = txn.open_table(CHUNKS_TABLE).map_err(db_error)?;
            for id in ids {
                let Some(&slot) = live.get(id) else { continue };
                let encoded = serde_json::to_vec(&slots[slot])?;
                table
                    .insert(id.to_string().as_str(), encoded.as_slice())
                    .map_err(db_error)?;
            }
        }
        txn.commit().map_err(db_error)
    }

    /// Number of chunks stored
    pub fn len(&self) -> usize {
        self.live.read().len()
    }

    /// Whether the store holds no chunks
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn db_error(e: impl std::fmt::Display) -> Error {
    Error::vector_db(e.to_string())
}

/// Directory of the fixed-name collection
pub fn collection_dir(config: &VectorDbConfig) -> PathBuf {
    config.storage_path.join(&config.collection_name)
}

/// Delete every generation except `keep`, returning how many were removed
pub fn prune_generations(config: &VectorDbConfig, keep: Uuid) -> Result<usize> {
    let dir = collection_dir(config);
    if !dir.exists() {
        return Ok(0);
    }

    let keep = keep.to_string();
    let mut removed = 0;

    for entry in std::fs::read_dir(&dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() || entry.file_name().to_string_lossy() == keep {
            continue;
        }
        std::fs::remove_dir_all(entry.path())?;
        removed += 1;
    }

    if removed > 0 {
        tracing::info!("Pruned {} superseded index generation(s)", removed);
    }

    Ok(removed)
}
