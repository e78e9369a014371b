//! Error type returned by the retrieval orchestrator.

use rag_store::{EmbedError, StoreError};
use thiserror::Error;

/// Every failed request maps to exactly one of these.
///
/// Enhancement failures never show up here; they are reported through
/// [`Enhanced::Degraded`](crate::enhance::Enhanced) instead.
#[derive(Debug, Error)]
pub enum SearchError {
    // ── Caller input ────────────────────────────────────────────────────────
    /// Empty question, id or text.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    // ── Collaborators ───────────────────────────────────────────────────────
    /// Embedding model could not be loaded or failed to embed.
    #[error("embedding provider unavailable")]
    ProviderUnavailable(#[source] EmbedError),

    /// Vector store could not be reached, initialized, or rejected the operation.
    #[error("vector store unavailable")]
    StoreUnavailable(#[source] StoreError),

    // ── Startup / batch ─────────────────────────────────────────────────────
    /// Invalid environment or wiring.
    #[error("config error: {0}")]
    Config(String),

    /// Filesystem error while ingesting a folder.
    #[error("io error")]
    Io(#[from] std::io::Error),
}

impl From<EmbedError> for SearchError {
    fn from(e: EmbedError) -> Self {
        match e {
            EmbedError::InvalidInput => SearchError::InvalidInput(e.to_string()),
            other => SearchError::ProviderUnavailable(other),
        }
    }
}

impl From<StoreError> for SearchError {
    fn from(e: StoreError) -> Self {
        SearchError::StoreUnavailable(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embed_errors_split_by_cause() {
        assert!(matches!(
            SearchError::from(EmbedError::InvalidInput),
            SearchError::InvalidInput(_)
        ));
        assert!(matches!(
            SearchError::from(EmbedError::Unavailable("down".into())),
            SearchError::ProviderUnavailable(EmbedError::Unavailable(_))
        ));
        assert!(matches!(
            SearchError::from(EmbedError::DimensionMismatch { got: 1, want: 2 }),
            SearchError::ProviderUnavailable(_)
        ));
    }

    #[test]
    fn store_errors_keep_their_source() {
        let err = SearchError::from(StoreError::DimensionMismatch { got: 3, want: 4 });
        assert!(matches!(
            err,
            SearchError::StoreUnavailable(StoreError::DimensionMismatch { got: 3, want: 4 })
        ));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn wrapped_errors_are_not_repeated_in_the_message() {
        let err = SearchError::from(StoreError::Qdrant("connection refused".into()));
        assert_eq!(err.to_string(), "vector store unavailable");
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("qdrant error: connection refused"));

        let err = SearchError::from(EmbedError::Unavailable("down".into()));
        assert_eq!(err.to_string(), "embedding provider unavailable");
        assert!(std::error::Error::source(&err).is_some());
    }
}
