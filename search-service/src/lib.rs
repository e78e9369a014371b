//! Public API:
//! - [`SemanticSearchService::search`]: validate → (rewrite) → embed → vector search → ranked results
//! - [`SemanticSearchService::search_with_reformulation`]: the same plus a synthesized answer
//! - [`SemanticSearchService::add_document`] / [`SemanticSearchService::add_documents`]: store fragments
//! - [`ingest_folder`]: load a directory of `*.txt` files
//!
//! Collaborators are shared handles passed in at construction; the service
//! keeps no per-request state and can be used concurrently behind an `Arc`.

pub mod enhance;
pub mod errors;
pub mod ingest;
pub mod progress;
pub mod prompt;
pub mod structs;

use std::sync::Arc;
use std::time::Instant;

use rag_store::{EmbeddingProvider, Metadata, RawHit, UpsertRequest, VectorStore, open_store};
use serde_json::Value;
use tracing::{debug, info, warn};

pub use enhance::{DegradeReason, Enhanced, EnhancementState, Enhancer, render_plain};
pub use errors::search_error::SearchError;
pub use ingest::{IngestFailure, IngestReport, ingest_folder};
pub use progress::{IndicatifProgress, NoopProgress, Progress};
pub use structs::search_config::{DEFAULT_TOP_K, SearchConfig};
pub use structs::search_result::{NewDocument, SearchResponse, SearchResult, ServiceStatus};

/// Metadata key carrying the caller's grouping id.
pub const DOCUMENT_ID_KEY: &str = "document_id";

/// Retrieval orchestrator.
pub struct SemanticSearchService {
    store: Arc<dyn VectorStore>,
    embedder: Arc<EmbeddingProvider>,
    enhancer: Enhancer,
    top_k: usize,
}

impl SemanticSearchService {
    /// Wires explicit collaborators.
    ///
    /// `store` should carry its own embedding function (usually the same
    /// `embedder`) so that [`add_document`](Self::add_document) can store text
    /// without a precomputed vector.
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<EmbeddingProvider>,
        enhancement: EnhancementState,
        top_k: usize,
    ) -> Self {
        Self {
            store,
            embedder,
            enhancer: Enhancer::new(enhancement),
            top_k,
        }
    }

    /// Builds every collaborator from `cfg`. No network activity happens here.
    ///
    /// # Errors
    /// Returns [`SearchError::Config`] for invalid or inconsistent settings.
    pub fn from_config(cfg: SearchConfig) -> Result<Self, SearchError> {
        let embedder = Arc::new(EmbeddingProvider::from_config(&cfg.embedding));
        let store = open_store(&cfg.store, Some(Arc::clone(&embedder)))
            .map_err(|e| SearchError::Config(e.to_string()))?;
        let enhancement = EnhancementState::from_config(cfg.generation)
            .map_err(|e| SearchError::Config(e.to_string()))?;

        info!(
            target: "search_service::init",
            backend = store.backend_name(),
            embedding_model = embedder.model_name(),
            dim = embedder.dimension(),
            enhancement = enhancement.is_configured(),
            top_k = cfg.top_k,
            "semantic search service ready"
        );
        Ok(Self::new(store, embedder, enhancement, cfg.top_k))
    }

    /// [`from_config`](Self::from_config) over [`SearchConfig::from_env`].
    pub fn from_env() -> Result<Self, SearchError> {
        Self::from_config(SearchConfig::from_env()?)
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Top-K fragments for `question`, best first.
    ///
    /// With `use_enhancement` the question is first rewritten by the LLM; if
    /// that is unavailable the original question is used unchanged.
    ///
    /// # Errors
    /// - [`SearchError::InvalidInput`] for an empty question
    /// - [`SearchError::ProviderUnavailable`] if the query cannot be embedded
    /// - [`SearchError::StoreUnavailable`] if the store search fails
    pub async fn search(
        &self,
        question: &str,
        use_enhancement: bool,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let question = validate_question(question)?;
        self.search_validated(question, use_enhancement).await
    }

    /// [`search`](Self::search) plus an answer synthesized from the results.
    ///
    /// The answer is produced only when `use_enhancement` is set and there is
    /// at least one result. It is built from the original question, and falls
    /// back to the plain `## Result N` rendering if generation is unavailable.
    ///
    /// # Errors
    /// Same as [`search`](Self::search).
    pub async fn search_with_reformulation(
        &self,
        question: &str,
        use_enhancement: bool,
    ) -> Result<SearchResponse, SearchError> {
        let question = validate_question(question)?;
        let results = self.search_validated(question, use_enhancement).await?;

        let reformulated_response = if use_enhancement && !results.is_empty() {
            let fragments: Vec<&str> = results.iter().map(|r| r.text.as_str()).collect();
            let answer = self.enhancer.reformulate(&fragments, question).await;
            if let Enhanced::Degraded { reason, .. } = &answer {
                debug!(target: "search_service::search", ?reason, "answer uses plain rendering");
            }
            Some(answer.into_value())
        } else {
            None
        };

        Ok(SearchResponse {
            results,
            reformulated_response,
        })
    }

    /// Alias of [`search_with_reformulation`](Self::search_with_reformulation).
    pub async fn retrieve(
        &self,
        question: &str,
        use_enhancement: bool,
    ) -> Result<SearchResponse, SearchError> {
        self.search_with_reformulation(question, use_enhancement).await
    }

    async fn search_validated(
        &self,
        question: &str,
        use_enhancement: bool,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let started = Instant::now();

        let query = if use_enhancement {
            self.enhancer.enhance(question).await.into_value()
        } else {
            question.to_string()
        };

        let vector = self.embedder.embed(&query).await.map_err(SearchError::from)?;
        debug!(target: "search_service::search", dim = vector.len(), "query embedded");

        let hits = self
            .store
            .search(&vector, self.top_k)
            .await
            .map_err(SearchError::from)?;

        let results = normalize_hits(hits);
        if results.is_empty() {
            info!(target: "search_service::search", "search returned no results");
        } else {
            info!(
                target: "search_service::search",
                results = results.len(),
                top_k = self.top_k,
                enhanced = use_enhancement,
                elapsed_ms = started.elapsed().as_millis(),
                "search completed"
            );
        }
        Ok(results)
    }

    /// Stores one fragment; the store computes its embedding.
    ///
    /// Re-adding an existing `id` replaces the fragment.
    ///
    /// # Errors
    /// - [`SearchError::InvalidInput`] for an empty id or text
    /// - [`SearchError::StoreUnavailable`] if the store or its embedding function fails
    pub async fn add_document(
        &self,
        id: &str,
        text: &str,
        document_id: i64,
    ) -> Result<(), SearchError> {
        let req = build_upsert(id, text, document_id)?;
        self.store.upsert(req).await.map_err(SearchError::from)?;
        info!(target: "search_service::store", id = %id.trim(), document_id, "document added");
        Ok(())
    }

    /// Stores `docs` in order and returns how many were stored.
    ///
    /// # Errors
    /// Stops at the first failing document and returns its error; earlier
    /// documents stay stored.
    pub async fn add_documents(&self, docs: &[NewDocument]) -> Result<usize, SearchError> {
        let mut stored = 0usize;
        for doc in docs {
            if let Err(e) = self.add_document(&doc.id, &doc.text, doc.document_id).await {
                warn!(target: "search_service::store", id = %doc.id, stored, error = %e, "batch ingestion stopped");
                return Err(e);
            }
            stored += 1;
        }
        Ok(stored)
    }

    /// Number of stored fragments.
    ///
    /// # Errors
    /// Returns [`SearchError::StoreUnavailable`] if the store fails.
    pub async fn get_collection_count(&self) -> Result<u64, SearchError> {
        let count = self.store.count().await.map_err(SearchError::from)?;
        debug!(target: "search_service::store", count, "collection count");
        Ok(count)
    }

    /// Corpus size plus the wiring in use.
    ///
    /// # Errors
    /// Returns [`SearchError::StoreUnavailable`] if the count fails.
    pub async fn status(&self) -> Result<ServiceStatus, SearchError> {
        Ok(ServiceStatus {
            total_documents: self.get_collection_count().await?,
            embedding_model: self.embedder.model_name().to_string(),
            store_backend: self.store.backend_name().to_string(),
            enhancement_configured: self.enhancer.is_configured(),
        })
    }
}

fn validate_question(question: &str) -> Result<&str, SearchError> {
    let q = question.trim();
    if q.is_empty() {
        return Err(SearchError::InvalidInput(
            "question must be a non-empty string".into(),
        ));
    }
    Ok(q)
}

fn build_upsert(id: &str, text: &str, document_id: i64) -> Result<UpsertRequest, SearchError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(SearchError::InvalidInput("document id must be non-empty".into()));
    }
    if text.trim().is_empty() {
        return Err(SearchError::InvalidInput(format!(
            "document '{id}' has empty text"
        )));
    }
    Ok(UpsertRequest::new(id, text).with_metadata(DOCUMENT_ID_KEY, document_id))
}

/// Store rank order is kept; ordinals are dense from 1.
fn normalize_hits(hits: Vec<RawHit>) -> Vec<SearchResult> {
    hits.into_iter()
        .enumerate()
        .map(|(i, hit)| SearchResult {
            ordinal: (i + 1) as u32,
            document_id: document_id_of(&hit.metadata),
            text: hit.text,
            score: clamp_score(hit.score),
        })
        .collect()
}

/// Integer or integer-valued string; anything else is 0.
fn document_id_of(metadata: &Metadata) -> i64 {
    match metadata.get(DOCUMENT_ID_KEY) {
        Some(Value::Number(n)) => n.as_i64().unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

fn clamp_score(score: f32) -> f32 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn hit(id: &str, score: f32, document_id: Option<Value>) -> RawHit {
        let mut metadata = Metadata::new();
        if let Some(v) = document_id {
            metadata.insert(DOCUMENT_ID_KEY.into(), v);
        }
        RawHit {
            id: id.into(),
            text: format!("text {id}"),
            distance: 0.0,
            score,
            metadata,
        }
    }

    #[test]
    fn document_id_accepts_integers_and_numeric_strings() {
        let ids: Vec<i64> = [
            Some(json!(7)),
            Some(json!(" 12 ")),
            Some(json!("abc")),
            Some(json!(1.5)),
            Some(json!(null)),
            None,
        ]
        .into_iter()
        .map(|v| document_id_of(&hit("x", 0.5, v).metadata))
        .collect();
        assert_eq!(ids, vec![7, 12, 0, 0, 0, 0]);
    }

    #[test]
    fn normalize_keeps_order_and_clamps() {
        let out = normalize_hits(vec![
            hit("b", 1.7, Some(json!(2))),
            hit("a", f32::NAN, Some(json!(2))),
            hit("c", -0.1, None),
        ]);
        assert_eq!(out.iter().map(|r| r.ordinal).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(out.iter().map(|r| r.score).collect::<Vec<_>>(), vec![1.0, 0.0, 0.0]);
        assert_eq!(out[0].text, "text b");
        assert_eq!(out[2].document_id, 0);
    }

    #[test]
    fn upsert_request_carries_document_id() {
        let req = build_upsert(" enz1 ", "Alpha-amylase", 1).unwrap();
        assert_eq!(req.id, "enz1");
        assert_eq!(req.vector, None);
        assert_eq!(req.metadata.get(DOCUMENT_ID_KEY), Some(&json!(1)));
        assert!(matches!(build_upsert(" ", "t", 0), Err(SearchError::InvalidInput(_))));
        assert!(matches!(build_upsert("id", "\n", 0), Err(SearchError::InvalidInput(_))));
    }
}
