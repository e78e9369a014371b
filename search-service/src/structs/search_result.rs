use serde::{Deserialize, Serialize};

/// One ranked match returned by the public search API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// 1-based rank within the response.
    pub ordinal: u32,

    /// Caller-supplied grouping key stored with the fragment (0 when absent).
    pub document_id: i64,

    /// Fragment text, verbatim.
    pub text: String,

    /// Similarity in `[0, 1]`, higher is closer.
    pub score: f32,
}

/// Ranked results plus the optional synthesized answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
    pub reformulated_response: Option<String>,
}

/// Input row for batch ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDocument {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub document_id: i64,
}

impl NewDocument {
    pub fn new(id: impl Into<String>, text: impl Into<String>, document_id: i64) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            document_id,
        }
    }
}

/// Snapshot of the service wiring and corpus size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub total_documents: u64,
    pub embedding_model: String,
    pub store_backend: String,
    pub enhancement_configured: bool,
}
