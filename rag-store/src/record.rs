//! Records exchanged with vector store backends.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::StoreError;

/// Flat key → scalar metadata attached to every fragment.
pub type Metadata = BTreeMap<String, Value>;

/// A fragment as persisted by a store backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredFragment {
    /// Caller-supplied unique key (upsert key).
    pub id: String,
    /// Verbatim fragment text.
    pub text: String,
    /// Embedding of `text`.
    pub embedding: Vec<f32>,
    /// Scalar metadata.
    #[serde(default)]
    pub metadata: Metadata,
}

/// One search match, best first in the returned list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawHit {
    pub id: String,
    pub text: String,
    /// Backend-native distance (lower is closer).
    pub distance: f32,
    /// Distance normalized into `[0, 1]` by the store's [`DistanceKind`](crate::DistanceKind).
    pub score: f32,
    pub metadata: Metadata,
}

/// Insert-or-replace request for a single fragment.
///
/// When `vector` is `None` the store computes it with its own embedding function.
#[derive(Debug, Clone, PartialEq)]
pub struct UpsertRequest {
    pub id: String,
    pub text: String,
    pub vector: Option<Vec<f32>>,
    pub metadata: Metadata,
}

impl UpsertRequest {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            vector: None,
            metadata: Metadata::new(),
        }
    }

    /// Supplies a precomputed embedding.
    pub fn with_vector(mut self, vector: Vec<f32>) -> Self {
        self.vector = Some(vector);
        self
    }

    /// Adds one metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Checks what every backend requires: a non-blank id and scalar metadata.
    ///
    /// # Errors
    /// Returns [`StoreError::InvalidRecord`] otherwise.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.id.trim().is_empty() {
            return Err(StoreError::InvalidRecord("id must be non-empty".into()));
        }
        if let Some((k, _)) = self
            .metadata
            .iter()
            .find(|(_, v)| v.is_object() || v.is_array())
        {
            return Err(StoreError::InvalidRecord(format!(
                "metadata value for `{k}` must be a scalar"
            )));
        }
        Ok(())
    }
}
