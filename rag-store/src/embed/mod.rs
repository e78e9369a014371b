//! Embedding provider: text → fixed-length vector.
//!
//! [`Embedder`] is the backend seam (remote model, local hashing, test fakes).
//! [`EmbeddingProvider`] wraps a backend loader with the guarantees callers
//! rely on: input validation, a single shared lazy load, and a dimension check
//! on every vector.

use std::{future::Future, pin::Pin, sync::Arc, time::Instant};

use futures::future::BoxFuture;
use tokio::sync::OnceCell;
use tracing::{debug, error, info};

use crate::config::{EmbedderKind, EmbeddingConfig};
use crate::errors::EmbedError;

pub mod hashing;
pub mod llm;

pub use hashing::HashingEmbedder;
pub use llm::LlmEmbedder;

/// Backend interface for embedding generation.
///
/// Async because most real backends perform HTTP requests.
pub trait Embedder: Send + Sync {
    fn embed<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, EmbedError>> + Send + 'a>>;
}

/// Future returned by an [`EmbedderLoader`].
pub type LoadFuture = BoxFuture<'static, Result<Arc<dyn Embedder>, EmbedError>>;

/// Produces a ready backend. Called at most once per successful load.
pub type EmbedderLoader = Box<dyn Fn() -> LoadFuture + Send + Sync>;

/// Shared embedding handle.
///
/// The backend is loaded on the first `embed` call; concurrent first callers
/// wait on the same load. A failed load leaves the cell empty, so a later
/// call may load again.
pub struct EmbeddingProvider {
    model: String,
    dim: usize,
    loader: EmbedderLoader,
    backend: OnceCell<Arc<dyn Embedder>>,
}

impl EmbeddingProvider {
    pub fn new(model: impl Into<String>, dim: usize, loader: EmbedderLoader) -> Self {
        Self {
            model: model.into(),
            dim,
            loader,
            backend: OnceCell::new(),
        }
    }

    /// Wraps an already constructed backend.
    pub fn from_embedder(model: impl Into<String>, dim: usize, embedder: Arc<dyn Embedder>) -> Self {
        Self::new(
            model,
            dim,
            Box::new(move || -> LoadFuture {
                let embedder = Arc::clone(&embedder);
                Box::pin(async move { Ok(embedder) })
            }),
        )
    }

    /// Builds the provider described by `cfg`. Nothing is loaded yet.
    pub fn from_config(cfg: &EmbeddingConfig) -> Self {
        let dim = cfg.dim;
        match &cfg.kind {
            EmbedderKind::Hashing => {
                Self::from_embedder(cfg.model_name(), dim, Arc::new(HashingEmbedder::new(dim)))
            }
            EmbedderKind::Llm(llm_cfg) => {
                let llm_cfg = llm_cfg.clone();
                Self::new(
                    cfg.model_name(),
                    dim,
                    Box::new(move || -> LoadFuture {
                        let llm_cfg = llm_cfg.clone();
                        Box::pin(async move {
                            let e = LlmEmbedder::load(llm_cfg, dim).await?;
                            Ok(Arc::new(e) as Arc<dyn Embedder>)
                        })
                    }),
                )
            }
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model
    }

    pub fn dimension(&self) -> usize {
        self.dim
    }

    pub fn is_loaded(&self) -> bool {
        self.backend.initialized()
    }

    /// Embeds `text`.
    ///
    /// # Errors
    /// - [`EmbedError::InvalidInput`] for empty/whitespace-only text
    /// - [`EmbedError::Unavailable`] if the backend cannot be loaded or fails
    /// - [`EmbedError::DimensionMismatch`] if the vector has the wrong length
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        if text.trim().is_empty() {
            return Err(EmbedError::InvalidInput);
        }

        let backend = self.backend().await?;
        let v = backend.embed(text).await?;
        if v.len() != self.dim {
            return Err(EmbedError::DimensionMismatch {
                got: v.len(),
                want: self.dim,
            });
        }

        debug!(target: "rag_store::embed", chars = text.len(), "embedded text");
        Ok(v)
    }

    async fn backend(&self) -> Result<&Arc<dyn Embedder>, EmbedError> {
        self.backend
            .get_or_try_init(|| async {
                info!(target: "rag_store::embed", model = %self.model, dim = self.dim, "loading embedding backend");
                let started = Instant::now();
                match (self.loader)().await {
                    Ok(b) => {
                        info!(
                            target: "rag_store::embed",
                            model = %self.model,
                            elapsed_ms = started.elapsed().as_millis(),
                            "embedding backend ready"
                        );
                        Ok(b)
                    }
                    Err(e) => {
                        error!(target: "rag_store::embed", model = %self.model, error = %e, "embedding backend failed to load");
                        Err(e)
                    }
                }
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    struct Fixed(Vec<f32>);

    impl Embedder for Fixed {
        fn embed<'a>(
            &'a self,
            _text: &'a str,
        ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, EmbedError>> + Send + 'a>> {
            Box::pin(async move { Ok(self.0.clone()) })
        }
    }

    fn counting_provider(loads: Arc<AtomicUsize>, fail_first: bool) -> EmbeddingProvider {
        EmbeddingProvider::new(
            "fixed",
            3,
            Box::new(move || -> LoadFuture {
                let loads = Arc::clone(&loads);
                Box::pin(async move {
                    let n = loads.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    if fail_first && n == 0 {
                        return Err(EmbedError::Unavailable("model download failed".into()));
                    }
                    Ok(Arc::new(Fixed(vec![1.0, 0.0, 0.0])) as Arc<dyn Embedder>)
                })
            }),
        )
    }

    #[tokio::test]
    async fn rejects_blank_input_without_loading() {
        let loads = Arc::new(AtomicUsize::new(0));
        let p = counting_provider(Arc::clone(&loads), false);
        assert_eq!(p.embed("").await, Err(EmbedError::InvalidInput));
        assert_eq!(p.embed("  \n\t").await, Err(EmbedError::InvalidInput));
        assert_eq!(loads.load(Ordering::SeqCst), 0);
        assert!(!p.is_loaded());
    }

    #[tokio::test]
    async fn concurrent_first_calls_share_one_load() {
        let loads = Arc::new(AtomicUsize::new(0));
        let p = Arc::new(counting_provider(Arc::clone(&loads), false));

        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let p = Arc::clone(&p);
                tokio::spawn(async move { p.embed(&format!("text {i}")).await })
            })
            .collect();
        for t in tasks {
            assert_eq!(t.await.unwrap().unwrap().len(), 3);
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert!(p.is_loaded());
    }

    #[tokio::test]
    async fn failed_load_is_retried_by_a_later_call() {
        let loads = Arc::new(AtomicUsize::new(0));
        let p = counting_provider(Arc::clone(&loads), true);

        assert!(matches!(p.embed("a").await, Err(EmbedError::Unavailable(_))));
        assert!(!p.is_loaded());
        assert!(p.embed("a").await.is_ok());
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn wrong_length_is_rejected() {
        let p = EmbeddingProvider::from_embedder("fixed", 4, Arc::new(Fixed(vec![1.0; 3])));
        assert_eq!(
            p.embed("x").await,
            Err(EmbedError::DimensionMismatch { got: 3, want: 4 })
        );
    }

    #[tokio::test]
    async fn hashing_config_embeds_offline() {
        let cfg = EmbeddingConfig {
            kind: EmbedderKind::Hashing,
            dim: 16,
        };
        let p = EmbeddingProvider::from_config(&cfg);
        assert_eq!(p.dimension(), 16);
        assert_eq!(p.model_name(), "hashing-16");
        assert_eq!(p.embed("amylase").await.unwrap().len(), 16);
    }
}
