//! Qdrant backend.
//!
//! Keeps all `qdrant-client` usage behind [`VectorStore`]. The client is built
//! and the collection ensured on first use, once per store.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use qdrant_client::qdrant::{
    CountPointsBuilder, CreateCollectionBuilder, Distance, PointStruct, ScoredPoint,
    SearchParamsBuilder, SearchPointsBuilder, UpsertPointsBuilder, Value as QValue,
    VectorParams, VectorParamsBuilder, vectors_config,
};
use qdrant_client::{Payload, Qdrant};
use serde_json::{Value, json};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{DistanceKind, StoreConfig};
use crate::embed::EmbeddingProvider;
use crate::errors::StoreError;
use crate::record::{Metadata, RawHit, UpsertRequest};
use crate::store::{VectorStore, resolve_vector};

const FIELD_ID: &str = "fragment_id";
const FIELD_TEXT: &str = "text";
const FIELD_METADATA: &str = "metadata";

pub struct QdrantStore {
    cfg: StoreConfig,
    embedder: Option<Arc<EmbeddingProvider>>,
    client: OnceCell<Qdrant>,
}

impl QdrantStore {
    /// Creates the store. Nothing is contacted until the first operation.
    ///
    /// # Errors
    /// Returns [`StoreError::Config`] if `cfg` is invalid.
    pub fn new(cfg: StoreConfig, embedder: Option<Arc<EmbeddingProvider>>) -> Result<Self, StoreError> {
        cfg.validate()?;
        Ok(Self {
            cfg,
            embedder,
            client: OnceCell::new(),
        })
    }

    async fn client(&self) -> Result<&Qdrant, StoreError> {
        self.client
            .get_or_try_init(|| async {
                let mut builder = Qdrant::from_url(&self.cfg.qdrant_url)
                    .timeout(Duration::from_secs(self.cfg.timeout_secs));
                if let Some(key) = &self.cfg.qdrant_api_key {
                    builder = builder.api_key(key.clone());
                }
                let client = builder
                    .build()
                    .map_err(|e| StoreError::Qdrant(format!("client build: {e}")))?;
                self.ensure_collection(&client).await?;
                Ok(client)
            })
            .await
    }

    /// Creates the collection if missing; an existing one must match our dimension and distance.
    async fn ensure_collection(&self, client: &Qdrant) -> Result<(), StoreError> {
        let name = &self.cfg.collection;
        let exists = client
            .collection_exists(name)
            .await
            .map_err(|e| StoreError::Qdrant(format!("collection_exists: {e}")))?;

        if exists {
            let info = client
                .collection_info(name)
                .await
                .map_err(|e| StoreError::Qdrant(format!("collection_info: {e}")))?;
            let params = info
                .result
                .and_then(|r| r.config)
                .and_then(|c| c.params)
                .and_then(|p| p.vectors_config)
                .and_then(|v| v.config)
                .and_then(|c| match c {
                    vectors_config::Config::Params(p) => Some(p),
                    vectors_config::Config::ParamsMap(_) => None,
                });
            match params {
                Some(p) => {
                    check_collection_params(&p, self.cfg.dim, self.cfg.distance)?;
                    debug!(target: "rag_store::qdrant", collection = %name, "collection exists");
                }
                None => warn!(
                    target: "rag_store::qdrant",
                    collection = %name,
                    "collection uses named vectors, dimension and distance not checked"
                ),
            }
            return Ok(());
        }

        client
            .create_collection(
                CreateCollectionBuilder::new(name).vectors_config(VectorParamsBuilder::new(
                    self.cfg.dim as u64,
                    qdrant_distance(self.cfg.distance),
                )),
            )
            .await
            .map_err(|e| StoreError::Qdrant(format!("create_collection: {e}")))?;

        info!(
            target: "rag_store::qdrant",
            collection = %name,
            dim = self.cfg.dim,
            distance = ?self.cfg.distance,
            "collection created"
        );
        Ok(())
    }

    fn to_hit(&self, sp: ScoredPoint) -> RawHit {
        let mut payload = payload_to_json(sp.payload);
        let id = match payload.remove(FIELD_ID) {
            Some(Value::String(s)) => s,
            _ => sp
                .id
                .and_then(|p| p.point_id_options)
                .map(|o| match o {
                    qdrant_client::qdrant::point_id::PointIdOptions::Uuid(s) => s,
                    qdrant_client::qdrant::point_id::PointIdOptions::Num(n) => n.to_string(),
                })
                .unwrap_or_default(),
        };
        let text = match payload.remove(FIELD_TEXT) {
            Some(Value::String(s)) => s,
            _ => String::new(),
        };
        let metadata: Metadata = match payload.remove(FIELD_METADATA) {
            Some(Value::Object(m)) => m.into_iter().collect(),
            _ => Metadata::new(),
        };

        let distance = self.cfg.distance.distance_from_qdrant_score(sp.score);
        RawHit {
            id,
            text,
            distance,
            score: self.cfg.distance.score_from_distance(distance),
            metadata,
        }
    }
}

impl VectorStore for QdrantStore {
    fn backend_name(&self) -> &'static str {
        "qdrant"
    }

    fn distance(&self) -> DistanceKind {
        self.cfg.distance
    }

    fn dimension(&self) -> usize {
        self.cfg.dim
    }

    fn search<'a>(
        &'a self,
        vector: &'a [f32],
        k: usize,
    ) -> BoxFuture<'a, Result<Vec<RawHit>, StoreError>> {
        Box::pin(async move {
            if vector.len() != self.cfg.dim {
                return Err(StoreError::DimensionMismatch {
                    got: vector.len(),
                    want: self.cfg.dim,
                });
            }
            if k == 0 {
                return Ok(Vec::new());
            }

            let client = self.client().await?;
            let mut builder =
                SearchPointsBuilder::new(&self.cfg.collection, vector.to_vec(), k as u64)
                    .with_payload(true);
            if self.cfg.exact_search {
                builder = builder.params(SearchParamsBuilder::default().exact(true));
            }

            let res = client
                .search_points(builder)
                .await
                .map_err(|e| StoreError::Qdrant(format!("search_points: {e}")))?;

            let hits: Vec<RawHit> = res.result.into_iter().map(|sp| self.to_hit(sp)).collect();
            debug!(
                target: "rag_store::qdrant",
                k,
                hits = hits.len(),
                exact = self.cfg.exact_search,
                "search completed"
            );
            Ok(hits)
        })
    }

    fn upsert(&self, mut req: UpsertRequest) -> BoxFuture<'_, Result<(), StoreError>> {
        Box::pin(async move {
            req.validate()?;
            let vector = resolve_vector(&mut req, self.embedder.as_deref(), self.cfg.dim).await?;
            let payload = build_payload(&req)?;
            let client = self.client().await?;

            let point = PointStruct::new(point_id(&req.id), vector, payload);
            client
                .upsert_points(UpsertPointsBuilder::new(&self.cfg.collection, vec![point]).wait(true))
                .await
                .map_err(|e| StoreError::Qdrant(format!("upsert_points: {e}")))?;

            debug!(target: "rag_store::qdrant", id = %req.id, "upsert");
            Ok(())
        })
    }

    fn count(&self) -> BoxFuture<'_, Result<u64, StoreError>> {
        Box::pin(async move {
            let client = self.client().await?;
            let res = client
                .count(CountPointsBuilder::new(&self.cfg.collection).exact(true))
                .await
                .map_err(|e| StoreError::Qdrant(format!("count: {e}")))?;
            Ok(res.result.map(|r| r.count).unwrap_or(0))
        })
    }
}

fn qdrant_distance(kind: DistanceKind) -> Distance {
    match kind {
        DistanceKind::Cosine => Distance::Cosine,
        DistanceKind::Dot => Distance::Dot,
        DistanceKind::Euclid => Distance::Euclid,
    }
}

/// An existing collection must use the configured size and [`DistanceKind`].
fn check_collection_params(
    params: &VectorParams,
    dim: usize,
    distance: DistanceKind,
) -> Result<(), StoreError> {
    if params.size as usize != dim {
        return Err(StoreError::DimensionMismatch {
            got: params.size as usize,
            want: dim,
        });
    }
    let actual = Distance::try_from(params.distance).unwrap_or(Distance::UnknownDistance);
    if actual != qdrant_distance(distance) {
        return Err(StoreError::Config(format!(
            "collection distance {} does not match configured {:?}",
            actual.as_str_name(),
            distance
        )));
    }
    Ok(())
}

/// Qdrant only accepts integers and UUIDs as point ids; string ids map to a stable UUIDv5.
fn point_id(id: &str) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, id.as_bytes()).to_string()
}

fn build_payload(req: &UpsertRequest) -> Result<Payload, StoreError> {
    let meta: serde_json::Map<String, Value> = req
        .metadata
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    let body = json!({
        FIELD_ID: req.id,
        FIELD_TEXT: req.text,
        FIELD_METADATA: meta,
    });
    Payload::try_from(body).map_err(|e| StoreError::InvalidRecord(format!("payload convert: {e}")))
}

fn payload_to_json(p: HashMap<String, QValue>) -> serde_json::Map<String, Value> {
    p.into_iter().map(|(k, v)| (k, v.into_json())).collect()
}
