//! Deterministic offline embedder.
//!
//! Feature hashing over lowercase alphanumeric tokens: each token lands in a
//! `blake3`-chosen bucket with a hash-chosen sign, and the vector is
//! L2-normalized. Texts that share words end up close under cosine distance,
//! which is enough for local runs and tests without a model server.

use std::{future::Future, pin::Pin};

use crate::{embed::Embedder, errors::EmbedError};

#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dim: usize,
}

impl HashingEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1) }
    }

    /// Synchronous core, shared with the async trait impl.
    pub fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dim];
        let lower = text.to_lowercase();

        let mut any = false;
        for token in lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            self.add_feature(&mut v, token);
            any = true;
        }
        if !any {
            self.add_feature(&mut v, lower.trim());
        }

        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut v {
                *x /= norm;
            }
        }
        v
    }

    fn add_feature(&self, v: &mut [f32], token: &str) {
        let hash = blake3::hash(token.as_bytes());
        let bytes = hash.as_bytes();
        let mut idx = [0u8; 8];
        idx.copy_from_slice(&bytes[..8]);
        let bucket = (u64::from_le_bytes(idx) % self.dim as u64) as usize;
        let sign = if bytes[8] & 1 == 0 { 1.0 } else { -1.0 };
        v[bucket] += sign;
    }
}

impl Embedder for HashingEmbedder {
    fn embed<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, EmbedError>> + Send + 'a>> {
        Box::pin(async move { Ok(self.embed_sync(text)) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DistanceKind;

    #[test]
    fn deterministic_and_normalized() {
        let e = HashingEmbedder::new(64);
        let a = e.embed_sync("Alpha-amylase is dosed at 20 ppm");
        let b = e.embed_sync("Alpha-amylase is dosed at 20 ppm");
        assert_eq!(a, b);
        let norm = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn shared_words_are_closer() {
        let e = HashingEmbedder::new(256);
        let doc = e.embed_sync("Alpha-amylase is dosed at 20 ppm to improve crumb structure.");
        let near = e.embed_sync("how much amylase should I use");
        let far = e.embed_sync("xylanase improves dough extensibility");
        let d = DistanceKind::Cosine;
        assert!(d.distance(&doc, &near) < d.distance(&doc, &far));
    }

    #[test]
    fn punctuation_only_text_is_not_zero() {
        let e = HashingEmbedder::new(8);
        assert!(e.embed_sync("?!").iter().any(|x| *x != 0.0));
    }
}
