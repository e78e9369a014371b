//! Embedding and vector storage for semantic retrieval.
//!
//! - [`EmbeddingProvider`]: text → fixed-length vector, lazily loaded once
//!   and shared by every caller
//! - [`VectorStore`]: upsert/search/count over Qdrant or an in-process map
//!
//! Both halves are configured from the environment ([`EmbeddingConfig`],
//! [`StoreConfig`]) or built directly for tests.

mod config;
mod embed;
mod errors;
mod record;
mod store;

pub use config::{
    DEFAULT_DIM, DistanceKind, EmbedderKind, EmbeddingConfig, StoreBackend, StoreConfig,
};
pub use embed::{
    Embedder, EmbedderLoader, EmbeddingProvider, HashingEmbedder, LlmEmbedder, LoadFuture,
};
pub use errors::{EmbedError, StoreError};
pub use record::{Metadata, RawHit, StoredFragment, UpsertRequest};
pub use store::{MemoryStore, QdrantStore, VectorStore, open_store};
