//! Runtime, collection and embedding configuration.
//!
//! `from_env()` constructors delegate to `from_lookup(..)` twins so tests can
//! supply a map instead of the process environment.

use std::str::FromStr;

use ai_llm_service::{
    LlmModelConfig, LlmProvider, config::default_config::config_embedding_from_lookup,
};

use crate::errors::StoreError;

/// Distance function used for the vector space.
///
/// Each kind also declares how a backend-native distance is turned into a
/// normalized score in `[0, 1]` (higher is more similar).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DistanceKind {
    /// Cosine distance `1 - cos` in `[0, 2]`; score `1 - d / 2`.
    Cosine,
    /// Negated dot product; score `(1 - d) / 2`, meaningful for unit vectors.
    Dot,
    /// Euclidean distance (L2); score `1 / (1 + d)`.
    Euclid,
}

impl DistanceKind {
    /// Maps a distance into a score clamped to `[0, 1]`. Non-finite input maps to 0.
    pub fn score_from_distance(self, distance: f32) -> f32 {
        let s = match self {
            DistanceKind::Cosine => 1.0 - distance / 2.0,
            DistanceKind::Dot => (1.0 - distance) / 2.0,
            DistanceKind::Euclid => 1.0 / (1.0 + distance),
        };
        if s.is_finite() { s.clamp(0.0, 1.0) } else { 0.0 }
    }

    /// Converts a Qdrant search score into this kind's distance.
    ///
    /// Qdrant reports cosine similarity, raw dot product, or L2 distance.
    pub fn distance_from_qdrant_score(self, score: f32) -> f32 {
        match self {
            DistanceKind::Cosine => 1.0 - score,
            DistanceKind::Dot => -score,
            DistanceKind::Euclid => score,
        }
    }

    /// Distance between two equal-length vectors.
    ///
    /// Cosine against a zero vector is treated as orthogonal (distance 1).
    pub fn distance(self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            DistanceKind::Cosine => {
                let (mut dot, mut na, mut nb) = (0.0f32, 0.0f32, 0.0f32);
                for (x, y) in a.iter().zip(b) {
                    dot += x * y;
                    na += x * x;
                    nb += y * y;
                }
                if na == 0.0 || nb == 0.0 {
                    return 1.0;
                }
                (1.0 - dot / (na.sqrt() * nb.sqrt())).clamp(0.0, 2.0)
            }
            DistanceKind::Dot => -a.iter().zip(b).map(|(x, y)| x * y).sum::<f32>(),
            DistanceKind::Euclid => a
                .iter()
                .zip(b)
                .map(|(x, y)| (x - y) * (x - y))
                .sum::<f32>()
                .sqrt(),
        }
    }
}

impl FromStr for DistanceKind {
    type Err = StoreError;

    /// Case-insensitive; accepts `cosine`, `dot`/`dotproduct`, `euclid`/`l2`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cosine" => Ok(DistanceKind::Cosine),
            "dot" | "dotproduct" => Ok(DistanceKind::Dot),
            "euclid" | "l2" => Ok(DistanceKind::Euclid),
            other => Err(StoreError::Config(format!("unsupported distance: {other}"))),
        }
    }
}

/// Which vector store implementation to open.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    /// In-process brute-force store.
    Memory,
    /// Qdrant over gRPC.
    Qdrant,
}

impl FromStr for StoreBackend {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" | "in-memory" => Ok(StoreBackend::Memory),
            "qdrant" => Ok(StoreBackend::Qdrant),
            other => Err(StoreError::Config(format!("unsupported DB_BACKEND: {other}"))),
        }
    }
}

/// Vector store configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Qdrant gRPC endpoint, e.g. `http://localhost:6334`.
    pub qdrant_url: String,
    /// Optional API key for Qdrant Cloud.
    pub qdrant_api_key: Option<String>,
    /// Target collection name.
    pub collection: String,
    /// Distance function (Cosine by default).
    pub distance: DistanceKind,
    /// Vector dimension of the collection.
    pub dim: usize,
    /// Exact search flag (false = HNSW ANN).
    pub exact_search: bool,
    /// Qdrant request timeout.
    pub timeout_secs: u64,
}

impl StoreConfig {
    /// Creates a sane default config for a given backend and dimension.
    pub fn new_default(backend: StoreBackend, dim: usize) -> Self {
        Self {
            backend,
            qdrant_url: "http://localhost:6334".into(),
            qdrant_api_key: None,
            collection: "semantic_search".into(),
            distance: DistanceKind::Cosine,
            dim,
            exact_search: false,
            timeout_secs: 10,
        }
    }

    /// Build configuration from environment variables.
    ///
    /// - `DB_BACKEND` (`qdrant` | `memory`; default `qdrant`)
    /// - `QDRANT_URL` (default `http://localhost:6334`)
    /// - `QDRANT_API_KEY` (optional)
    /// - `QDRANT_COLLECTION` (default `semantic_search`)
    /// - `QDRANT_DISTANCE` (`Cosine` | `Dot` | `Euclid`; default `Cosine`)
    /// - `QDRANT_EXACT_SEARCH` (default `false`)
    /// - `QDRANT_TIMEOUT_SECS` (default 10)
    /// - `EMBEDDING_DIM` (default 384)
    pub fn from_env() -> Result<Self, StoreError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Same as [`StoreConfig::from_env`] over an arbitrary lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, StoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend = match read_var(&lookup, "DB_BACKEND") {
            Some(v) => v.parse()?,
            None => StoreBackend::Qdrant,
        };
        let distance = match read_var(&lookup, "QDRANT_DISTANCE") {
            Some(v) => v.parse()?,
            None => DistanceKind::Cosine,
        };

        let cfg = Self {
            backend,
            qdrant_url: read_var(&lookup, "QDRANT_URL")
                .unwrap_or_else(|| "http://localhost:6334".into()),
            qdrant_api_key: read_var(&lookup, "QDRANT_API_KEY"),
            collection: read_var(&lookup, "QDRANT_COLLECTION")
                .unwrap_or_else(|| "semantic_search".into()),
            distance,
            dim: read_parsed(&lookup, "EMBEDDING_DIM")?.unwrap_or(DEFAULT_DIM),
            exact_search: read_parsed(&lookup, "QDRANT_EXACT_SEARCH")?.unwrap_or(false),
            timeout_secs: read_parsed(&lookup, "QDRANT_TIMEOUT_SECS")?.unwrap_or(10),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validates config values.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.dim == 0 {
            return Err(StoreError::Config("EMBEDDING_DIM must be > 0".into()));
        }
        if self.backend == StoreBackend::Qdrant {
            if self.qdrant_url.trim().is_empty() {
                return Err(StoreError::Config("qdrant_url is empty".into()));
            }
            if self.collection.trim().is_empty() {
                return Err(StoreError::Config("collection is empty".into()));
            }
        }
        Ok(())
    }
}

/// all-MiniLM-L6-v2 output size.
pub const DEFAULT_DIM: usize = 384;

/// Which embedding backend the provider loads.
#[derive(Clone, Debug, PartialEq)]
pub enum EmbedderKind {
    /// Deterministic local token hashing, no network.
    Hashing,
    /// Remote model reached through `ai-llm-service`.
    Llm(LlmModelConfig),
}

/// Embedding provider configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct EmbeddingConfig {
    pub kind: EmbedderKind,
    pub dim: usize,
}

impl EmbeddingConfig {
    /// Build configuration from environment variables.
    ///
    /// - `EMBEDDING_PROVIDER` (`ollama` | `openai` | `gemini` | `hashing`; default `ollama`)
    /// - `EMBEDDING_DIM` (default 384)
    /// - provider variables, see `ai_llm_service::config::default_config`
    pub fn from_env() -> Result<Self, StoreError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Same as [`EmbeddingConfig::from_env`] over an arbitrary lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, StoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let dim = read_parsed(&lookup, "EMBEDDING_DIM")?.unwrap_or(DEFAULT_DIM);
        if dim == 0 {
            return Err(StoreError::Config("EMBEDDING_DIM must be > 0".into()));
        }

        let provider = read_var(&lookup, "EMBEDDING_PROVIDER").unwrap_or_else(|| "ollama".into());
        let kind = if provider.eq_ignore_ascii_case("hashing") {
            EmbedderKind::Hashing
        } else {
            let provider: LlmProvider = provider
                .parse()
                .map_err(|e| StoreError::Config(format!("{e}")))?;
            let cfg = config_embedding_from_lookup(provider, &lookup)
                .map_err(|e| StoreError::Config(e.to_string()))?;
            EmbedderKind::Llm(cfg)
        };

        Ok(Self { kind, dim })
    }

    /// Model identifier reported in status payloads.
    pub fn model_name(&self) -> String {
        match &self.kind {
            EmbedderKind::Hashing => format!("hashing-{}", self.dim),
            EmbedderKind::Llm(cfg) => cfg.model.clone(),
        }
    }
}

fn read_var<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Reads and parses an optional variable, mapping parse failures to `StoreError::Config`.
fn read_parsed<F, T>(lookup: &F, key: &str) -> Result<Option<T>, StoreError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match read_var(lookup, key) {
        Some(v) => v
            .parse::<T>()
            .map(Some)
            .map_err(|_| StoreError::Config(format!("failed to parse {key} = '{v}'"))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k: &str| map.get(k).cloned()
    }

    #[test]
    fn cosine_score_mapping() {
        let k = DistanceKind::Cosine;
        assert_eq!(k.score_from_distance(0.0), 1.0);
        assert_eq!(k.score_from_distance(1.0), 0.5);
        assert_eq!(k.score_from_distance(2.0), 0.0);
        assert_eq!(k.score_from_distance(3.0), 0.0);
        assert_eq!(k.score_from_distance(-0.5), 1.0);
        assert_eq!(k.score_from_distance(f32::NAN), 0.0);
    }

    #[test]
    fn euclid_and_dot_scores_stay_in_unit_range() {
        for d in [0.0, 0.5, 1.0, 10.0, 1e9] {
            let s = DistanceKind::Euclid.score_from_distance(d);
            assert!((0.0..=1.0).contains(&s));
        }
        assert_eq!(DistanceKind::Dot.score_from_distance(-1.0), 1.0);
        assert_eq!(DistanceKind::Dot.score_from_distance(1.0), 0.0);
        assert_eq!(DistanceKind::Dot.score_from_distance(-5.0), 1.0);
    }

    #[test]
    fn distances() {
        let a = [1.0, 0.0];
        let b = [0.0, 1.0];
        assert!((DistanceKind::Cosine.distance(&a, &a)).abs() < 1e-6);
        assert!((DistanceKind::Cosine.distance(&a, &b) - 1.0).abs() < 1e-6);
        assert_eq!(DistanceKind::Cosine.distance(&a, &[0.0, 0.0]), 1.0);
        assert!((DistanceKind::Euclid.distance(&a, &b) - 2f32.sqrt()).abs() < 1e-6);
        assert_eq!(DistanceKind::Dot.distance(&a, &a), -1.0);
    }

    #[test]
    fn qdrant_scores_round_trip_through_distance() {
        let k = DistanceKind::Cosine;
        let d = k.distance_from_qdrant_score(0.8);
        assert!((k.score_from_distance(d) - 0.9).abs() < 1e-6);
    }

    #[test]
    fn store_config_defaults_and_overrides() {
        let cfg = StoreConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(cfg, StoreConfig::new_default(StoreBackend::Qdrant, 384));

        let cfg = StoreConfig::from_lookup(lookup_from(&[
            ("DB_BACKEND", "memory"),
            ("QDRANT_DISTANCE", "euclid"),
            ("EMBEDDING_DIM", "8"),
        ]))
        .unwrap();
        assert_eq!(cfg.backend, StoreBackend::Memory);
        assert_eq!(cfg.distance, DistanceKind::Euclid);
        assert_eq!(cfg.dim, 8);
    }

    #[test]
    fn store_config_rejects_bad_values() {
        assert!(StoreConfig::from_lookup(lookup_from(&[("DB_BACKEND", "chroma")])).is_err());
        assert!(StoreConfig::from_lookup(lookup_from(&[("EMBEDDING_DIM", "0")])).is_err());
        assert!(StoreConfig::from_lookup(lookup_from(&[("QDRANT_EXACT_SEARCH", "maybe")])).is_err());
    }

    #[test]
    fn embedding_config_selects_backend() {
        let cfg = EmbeddingConfig::from_lookup(lookup_from(&[("EMBEDDING_PROVIDER", "hashing")]))
            .unwrap();
        assert_eq!(cfg.kind, EmbedderKind::Hashing);
        assert_eq!(cfg.model_name(), "hashing-384");

        let cfg = EmbeddingConfig::from_lookup(lookup_from(&[
            ("OLLAMA_URL", "http://localhost:11434"),
            ("EMBEDDING_MODEL", "all-minilm"),
        ]))
        .unwrap();
        assert_eq!(cfg.model_name(), "all-minilm");

        assert!(EmbeddingConfig::from_lookup(lookup_from(&[])).is_err());
    }
}
