//! Holder of the active pipeline
//!
//! Queries take an `Arc` snapshot and keep using it even if a new pipeline is
//! installed mid-request. Builds are serialized so two uploads never write
//! the collection at the same time; a failed build leaves the current
//! pipeline in place.

use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::Result;
use crate::retrieval::prune_generations;
use crate::types::SourceSummary;

use super::builder::{PipelineBuilder, SourceFile};
use super::RagPipeline;

/// Registry of the single active pipeline
pub struct PipelineRegistry {
    builder: PipelineBuilder,
    active: RwLock<Option<Arc<RagPipeline>>>,
    build_lock: Mutex<()>,
}

impl PipelineRegistry {
    /// Create an empty registry
    pub fn new(builder: PipelineBuilder) -> Self {
        Self {
            builder,
            active: RwLock::new(None),
            build_lock: Mutex::new(()),
        }
    }

    /// Snapshot of the active pipeline, if any
    pub fn current(&self) -> Option<Arc<RagPipeline>> {
        self.active.read().clone()
    }

    /// Summary of the active pipeline's source
    pub fn summary(&self) -> Option<SourceSummary> {
        self.active.read().as_ref().map(|p| p.summary().clone())
    }

    /// Build a pipeline for `source` and install it as the active one.
    ///
    /// Construction failures come back as client errors; the previous
    /// pipeline stays active.
    pub async fn rebuild(&self, source: SourceFile) -> Result<SourceSummary> {
        let _guard = self.build_lock.lock().await;

        let pipeline = match self.builder.build(source).await {
            Ok(pipeline) => Arc::new(pipeline),
            Err(e) => {
                tracing::warn!("Pipeline build failed, keeping previous pipeline: {}", e);
                return Err(e.into_build_error());
            }
        };

        let summary = pipeline.summary().clone();
        let previous = self.active.write().replace(pipeline);

        if let Some(previous) = previous {
            tracing::info!(
                "Replaced pipeline {} with {}",
                previous.summary().build_id,
                summary.build_id
            );
        }

        let vector_db = self.builder.vector_db().clone();
        let keep = summary.build_id;
        match tokio::task::spawn_blocking(move || prune_generations(&vector_db, keep)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => tracing::warn!("Failed to prune old index generations: {}", e),
            Err(e) => tracing::warn!("Prune task failed: {}", e),
        }

        Ok(summary)
    }
}
