//! In-process brute-force store.
//!
//! Exact search over every fragment. The lock is only taken for synchronous
//! map access and never held across an `.await`.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use futures::future::BoxFuture;
use tracing::debug;

use crate::config::DistanceKind;
use crate::embed::EmbeddingProvider;
use crate::errors::StoreError;
use crate::record::{RawHit, StoredFragment, UpsertRequest};
use crate::store::{VectorStore, resolve_vector};

pub struct MemoryStore {
    dim: usize,
    distance: DistanceKind,
    embedder: Option<Arc<EmbeddingProvider>>,
    fragments: RwLock<HashMap<String, StoredFragment>>,
}

impl MemoryStore {
    pub fn new(dim: usize, distance: DistanceKind, embedder: Option<Arc<EmbeddingProvider>>) -> Self {
        Self {
            dim,
            distance,
            embedder,
            fragments: RwLock::new(HashMap::new()),
        }
    }

    /// Copy of a stored fragment, mainly for inspection in tests.
    pub fn get(&self, id: &str) -> Option<StoredFragment> {
        self.fragments
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    fn search_sync(&self, vector: &[f32], k: usize) -> Result<Vec<RawHit>, StoreError> {
        if vector.len() != self.dim {
            return Err(StoreError::DimensionMismatch {
                got: vector.len(),
                want: self.dim,
            });
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let guard = self.fragments.read().unwrap_or_else(PoisonError::into_inner);
        let mut scored: Vec<(f32, &StoredFragment)> = guard
            .values()
            .map(|f| (self.distance.distance(vector, &f.embedding), f))
            .collect();

        scored.sort_by(|(da, a), (db, b)| da.total_cmp(db).then_with(|| a.id.cmp(&b.id)));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(d, f)| RawHit {
                id: f.id.clone(),
                text: f.text.clone(),
                distance: d,
                score: self.distance.score_from_distance(d),
                metadata: f.metadata.clone(),
            })
            .collect())
    }
}

impl VectorStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    fn distance(&self) -> DistanceKind {
        self.distance
    }

    fn dimension(&self) -> usize {
        self.dim
    }

    fn search<'a>(
        &'a self,
        vector: &'a [f32],
        k: usize,
    ) -> BoxFuture<'a, Result<Vec<RawHit>, StoreError>> {
        Box::pin(async move {
            let hits = self.search_sync(vector, k)?;
            debug!(target: "rag_store::memory", k, hits = hits.len(), "search completed");
            Ok(hits)
        })
    }

    fn upsert(&self, mut req: UpsertRequest) -> BoxFuture<'_, Result<(), StoreError>> {
        Box::pin(async move {
            req.validate()?;
            let embedding = resolve_vector(&mut req, self.embedder.as_deref(), self.dim).await?;

            let fragment = StoredFragment {
                id: req.id,
                text: req.text,
                embedding,
                metadata: req.metadata,
            };
            debug!(target: "rag_store::memory", id = %fragment.id, "upsert");
            self.fragments
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(fragment.id.clone(), fragment);
            Ok(())
        })
    }

    fn count(&self) -> BoxFuture<'_, Result<u64, StoreError>> {
        Box::pin(async move {
            Ok(self
                .fragments
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .len() as u64)
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::embed::HashingEmbedder;

    fn unit(dim: usize, i: usize) -> Vec<f32> {
        let mut v = vec![0.0; dim];
        v[i] = 1.0;
        v
    }

    #[tokio::test]
    async fn empty_store_returns_no_hits() {
        let store = MemoryStore::new(3, DistanceKind::Cosine, None);
        assert!(store.search(&[1.0, 0.0, 0.0], 3).await.unwrap().is_empty());
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn returns_min_of_n_and_k_best_first() {
        let store = MemoryStore::new(3, DistanceKind::Cosine, None);
        store
            .upsert(UpsertRequest::new("a", "A").with_vector(vec![1.0, 0.0, 0.0]))
            .await
            .unwrap();
        store
            .upsert(UpsertRequest::new("b", "B").with_vector(vec![0.7, 0.7, 0.0]))
            .await
            .unwrap();
        store
            .upsert(UpsertRequest::new("c", "C").with_vector(vec![-1.0, 0.0, 0.0]))
            .await
            .unwrap();

        let hits = store.search(&[1.0, 0.0, 0.0], 2).await.unwrap();
        assert_eq!(hits.iter().map(|h| h.id.as_str()).collect::<Vec<_>>(), vec!["a", "b"]);
        assert!((hits[0].score - 1.0).abs() < 1e-6);

        let hits = store.search(&[1.0, 0.0, 0.0], 10).await.unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[2].id, "c");
        assert!(hits.iter().all(|h| (0.0..=1.0).contains(&h.score)));
        assert!(hits[2].score.abs() < 1e-6);

        assert!(store.search(&[1.0, 0.0, 0.0], 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn ties_break_by_id() {
        let store = MemoryStore::new(2, DistanceKind::Euclid, None);
        for id in ["z", "m", "a"] {
            store
                .upsert(UpsertRequest::new(id, id).with_vector(unit(2, 0)))
                .await
                .unwrap();
        }
        let hits = store.search(&unit(2, 0), 3).await.unwrap();
        assert_eq!(hits.iter().map(|h| h.id.as_str()).collect::<Vec<_>>(), vec!["a", "m", "z"]);
        assert_eq!(hits[0].score, 1.0);
    }

    #[tokio::test]
    async fn upsert_replaces_in_place() {
        let store = MemoryStore::new(2, DistanceKind::Cosine, None);
        store
            .upsert(UpsertRequest::new("doc1", "A").with_vector(unit(2, 0)))
            .await
            .unwrap();
        store
            .upsert(
                UpsertRequest::new("doc1", "B")
                    .with_vector(unit(2, 1))
                    .with_metadata("document_id", 2),
            )
            .await
            .unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
        let f = store.get("doc1").unwrap();
        assert_eq!(f.text, "B");
        assert_eq!(f.metadata.get("document_id"), Some(&json!(2)));
    }

    #[tokio::test]
    async fn dimension_mismatch_is_rejected_and_leaves_state() {
        let store = MemoryStore::new(3, DistanceKind::Cosine, None);
        store
            .upsert(UpsertRequest::new("doc1", "A").with_vector(unit(3, 0)))
            .await
            .unwrap();

        let err = store
            .upsert(UpsertRequest::new("doc1", "B").with_vector(vec![1.0, 0.0]))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DimensionMismatch { got: 2, want: 3 }));
        assert_eq!(store.get("doc1").unwrap().text, "A");

        let err = store.search(&[1.0], 1).await.unwrap_err();
        assert!(matches!(err, StoreError::DimensionMismatch { got: 1, want: 3 }));
    }

    #[tokio::test]
    async fn missing_vector_needs_embedding_function() {
        let store = MemoryStore::new(3, DistanceKind::Cosine, None);
        let err = store.upsert(UpsertRequest::new("a", "text")).await.unwrap_err();
        assert!(matches!(err, StoreError::EmbeddingUnsupported));
    }

    #[tokio::test]
    async fn embeds_with_attached_provider() {
        let provider = Arc::new(EmbeddingProvider::from_embedder(
            "hashing-32",
            32,
            Arc::new(HashingEmbedder::new(32)),
        ));
        let store = MemoryStore::new(32, DistanceKind::Cosine, Some(provider));
        store
            .upsert(UpsertRequest::new("enz1", "Alpha-amylase dosage"))
            .await
            .unwrap();
        assert_eq!(store.get("enz1").unwrap().embedding.len(), 32);

        let err = store.upsert(UpsertRequest::new("blank", "   ")).await.unwrap_err();
        assert!(matches!(err, StoreError::Embedding(_)));
        assert_eq!(store.count().await.unwrap(), 1);
    }
}
