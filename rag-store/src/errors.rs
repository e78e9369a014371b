//! Unified error types for the crate.

use thiserror::Error;

/// Errors produced by the embedding provider.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EmbedError {
    /// Text was empty or whitespace-only.
    #[error("embedding input must be non-empty text")]
    InvalidInput,

    /// Backend failed to load or to answer.
    #[error("embedding backend unavailable: {0}")]
    Unavailable(String),

    /// Backend returned a vector of the wrong length.
    #[error("embedding dimension mismatch: got {got}, want {want}")]
    DimensionMismatch { got: usize, want: usize },
}

/// Top-level error for vector store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Invalid or unsupported configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Record rejected before it reached the backend (empty id, nested metadata).
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// Qdrant client errors (wrapped).
    #[error("qdrant error: {0}")]
    Qdrant(String),

    /// Vector length differs from the collection dimension.
    #[error("vector size mismatch: got {got}, want {want}")]
    DimensionMismatch { got: usize, want: usize },

    /// Upsert without a vector on a store that has no embedding function.
    #[error("missing embedding and no embedding function attached to the store")]
    EmbeddingUnsupported,

    /// The store's embedding function failed.
    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbedError),
}
