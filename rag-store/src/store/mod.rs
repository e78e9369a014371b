//! Backend-agnostic vector store contract and the backend factory.

use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::info;

use crate::config::{DistanceKind, StoreBackend, StoreConfig};
use crate::embed::EmbeddingProvider;
use crate::errors::StoreError;
use crate::record::{RawHit, UpsertRequest};

pub mod memory;
pub mod qdrant;

pub use memory::MemoryStore;
pub use qdrant::QdrantStore;

/// Persistent (or in-process) fragment store with similarity search.
///
/// Implementations must:
/// - return at most `k` hits, best first, each score in `[0, 1]` as mapped by
///   [`VectorStore::distance`];
/// - treat `upsert` as insert-or-replace keyed by id, leaving the previous
///   fragment untouched when the call fails;
/// - reject vectors whose length differs from [`VectorStore::dimension`].
pub trait VectorStore: Send + Sync {
    /// Short backend name for logs and status.
    fn backend_name(&self) -> &'static str;

    /// Metric used to rank hits and normalize scores.
    fn distance(&self) -> DistanceKind;

    /// Vector length every fragment and query must have.
    fn dimension(&self) -> usize;

    fn search<'a>(
        &'a self,
        vector: &'a [f32],
        k: usize,
    ) -> BoxFuture<'a, Result<Vec<RawHit>, StoreError>>;

    fn upsert(&self, req: UpsertRequest) -> BoxFuture<'_, Result<(), StoreError>>;

    fn count(&self) -> BoxFuture<'_, Result<u64, StoreError>>;
}

/// Opens the backend selected by `cfg.backend`.
///
/// `embedder` becomes the store's embedding function for upserts without a
/// vector. Connection work is deferred to first use.
///
/// # Errors
/// Returns [`StoreError::Config`] on invalid config or when the embedder's
/// dimension differs from the store's.
pub fn open_store(
    cfg: &StoreConfig,
    embedder: Option<Arc<EmbeddingProvider>>,
) -> Result<Arc<dyn VectorStore>, StoreError> {
    cfg.validate()?;
    if let Some(e) = &embedder {
        if e.dimension() != cfg.dim {
            return Err(StoreError::Config(format!(
                "embedding dimension {} does not match store dimension {}",
                e.dimension(),
                cfg.dim
            )));
        }
    }

    info!(
        target: "rag_store::store",
        backend = ?cfg.backend,
        distance = ?cfg.distance,
        dim = cfg.dim,
        "opening vector store"
    );

    Ok(match cfg.backend {
        StoreBackend::Memory => Arc::new(MemoryStore::new(cfg.dim, cfg.distance, embedder)),
        StoreBackend::Qdrant => Arc::new(QdrantStore::new(cfg.clone(), embedder)?),
    })
}

/// Resolves the vector for an upsert: supplied, or computed by the store's embedder.
pub(crate) async fn resolve_vector(
    req: &mut UpsertRequest,
    embedder: Option<&EmbeddingProvider>,
    dim: usize,
) -> Result<Vec<f32>, StoreError> {
    let vector = match req.vector.take() {
        Some(v) => v,
        None => match embedder {
            Some(e) => e.embed(&req.text).await?,
            None => return Err(StoreError::EmbeddingUnsupported),
        },
    };
    if vector.len() != dim {
        return Err(StoreError::DimensionMismatch {
            got: vector.len(),
            want: dim,
        });
    }
    Ok(vector)
}
