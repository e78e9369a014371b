//! Configuration layer: reads runtime settings from environment variables and
//! bundles the typed configs of every collaborator the service wires up.

use ai_llm_service::{LlmModelConfig, config::default_config::config_generation_from_lookup};
use rag_store::{EmbeddingConfig, StoreConfig};

use crate::errors::search_error::SearchError;

/// Results returned per query when `RAG_TOP_K` is unset.
pub const DEFAULT_TOP_K: usize = 3;

/// Everything [`SemanticSearchService::from_config`](crate::SemanticSearchService::from_config) needs.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    /// Results per query.
    pub top_k: usize,
    /// Vector store backend and connection.
    pub store: StoreConfig,
    /// Embedding backend and dimension.
    pub embedding: EmbeddingConfig,
    /// Text generation for query rewrite and answer synthesis; `None` disables it.
    pub generation: Option<LlmModelConfig>,
}

impl SearchConfig {
    /// Build configuration from environment variables.
    ///
    /// - `RAG_TOP_K` (default 3, must be > 0)
    /// - store, embedding and generation variables, see the respective crates
    pub fn from_env() -> Result<Self, SearchError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Same as [`SearchConfig::from_env`] over an arbitrary lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SearchError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let top_k = match lookup("RAG_TOP_K").map(|v| v.trim().to_string()) {
            Some(v) if !v.is_empty() => v
                .parse::<usize>()
                .map_err(|_| SearchError::Config(format!("failed to parse RAG_TOP_K = '{v}'")))?,
            _ => DEFAULT_TOP_K,
        };
        if top_k == 0 {
            return Err(SearchError::Config("RAG_TOP_K must be > 0".into()));
        }

        let store = StoreConfig::from_lookup(&lookup).map_err(|e| SearchError::Config(e.to_string()))?;
        let embedding =
            EmbeddingConfig::from_lookup(&lookup).map_err(|e| SearchError::Config(e.to_string()))?;
        let generation =
            config_generation_from_lookup(&lookup).map_err(|e| SearchError::Config(e.to_string()))?;

        Ok(Self {
            top_k,
            store,
            embedding,
            generation,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;
    use rag_store::{EmbedderKind, StoreBackend};

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn offline_defaults() {
        let cfg = SearchConfig::from_lookup(lookup(&[
            ("DB_BACKEND", "memory"),
            ("EMBEDDING_PROVIDER", "hashing"),
        ]))
        .unwrap();
        assert_eq!(cfg.top_k, DEFAULT_TOP_K);
        assert_eq!(cfg.store.backend, StoreBackend::Memory);
        assert_eq!(cfg.embedding.kind, EmbedderKind::Hashing);
        assert_eq!(cfg.embedding.dim, 384);
        assert_eq!(cfg.generation, None);
    }

    #[test]
    fn top_k_is_validated() {
        let base = [("DB_BACKEND", "memory"), ("EMBEDDING_PROVIDER", "hashing")];

        let mut pairs = base.to_vec();
        pairs.push(("RAG_TOP_K", "5"));
        assert_eq!(SearchConfig::from_lookup(lookup(&pairs)).unwrap().top_k, 5);

        for bad in ["0", "three"] {
            let mut pairs = base.to_vec();
            pairs.push(("RAG_TOP_K", bad));
            assert!(matches!(
                SearchConfig::from_lookup(lookup(&pairs)),
                Err(SearchError::Config(_))
            ));
        }
    }

    #[test]
    fn generation_enabled_by_api_key() {
        let cfg = SearchConfig::from_lookup(lookup(&[
            ("DB_BACKEND", "memory"),
            ("EMBEDDING_PROVIDER", "hashing"),
            ("LLM_KIND", "gemini"),
            ("GEMINI_API_KEY", "k"),
        ]))
        .unwrap();
        let generation = cfg.generation.unwrap();
        assert_eq!(generation.model, "gemini-1.5-flash");
        assert_eq!(generation.api_key.as_deref(), Some("k"));
    }
}
