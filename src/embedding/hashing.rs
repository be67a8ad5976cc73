//! Deterministic feature-hashing embedder.
//!
//! Character trigrams of the padded, lower-cased text plus whole words are
//! hashed into a fixed number of signed buckets, then unit-normalised.
//! Identical strings always embed identically; strings sharing most
//! trigrams land close together. No model download, no network.

use sha2::{Digest, Sha256};

use super::{EmbeddingProvider, normalize};
use crate::Result;

/// Default output dimension, matching common small sentence encoders.
pub const DEFAULT_DIMENSION: usize = 384;

#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension: dimension.max(1) }
    }

    fn add_feature(&self, acc: &mut [f32], feature: &str, weight: f32) {
        let h = feature_hash(feature);
        let bucket = (h % self.dimension as u64) as usize;
        let sign = if h >> 63 == 1 { -1.0 } else { 1.0 };
        acc[bucket] += sign * weight;
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

impl EmbeddingProvider for HashingEmbedder {
    fn kind(&self) -> &str {
        "hashing"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut acc = vec![0.0f32; self.dimension];
        let lowered = text.trim().to_lowercase();
        if lowered.is_empty() {
            return Ok(acc);
        }

        let padded: Vec<char> = format!(" {lowered} ").chars().collect();
        let mut gram = String::with_capacity(12);
        for window in padded.windows(3) {
            gram.clear();
            gram.extend(window);
            self.add_feature(&mut acc, &gram, 1.0);
        }
        for word in lowered.split_whitespace() {
            self.add_feature(&mut acc, &format!("w:{word}"), 2.0);
        }

        normalize(&mut acc);
        Ok(acc)
    }
}

/// First eight bytes of the feature's SHA-256, stable across toolchains.
fn feature_hash(s: &str) -> u64 {
    let digest = Sha256::digest(s.as_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(head)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::matrix::dot;

    #[test]
    fn test_identical_text_identical_vector() {
        let e = HashingEmbedder::default();
        let a = e.embed("Acme Corporation").unwrap();
        let b = e.embed("Acme Corporation").unwrap();
        assert_eq!(a, b);
        assert!((dot(&a, &a) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_case_insensitive() {
        let e = HashingEmbedder::default();
        assert_eq!(e.embed("ACME").unwrap(), e.embed("acme").unwrap());
    }

    #[test]
    fn test_related_closer_than_unrelated() {
        let e = HashingEmbedder::default();
        let a = e.embed("Acme Corporation").unwrap();
        let b = e.embed("Acme Corp").unwrap();
        let c = e.embed("Zebra Pharmaceuticals").unwrap();
        assert!(dot(&a, &b) > dot(&a, &c));
    }

    #[test]
    fn test_feature_hash_is_pinned() {
        // Embeddings feed a persisted projection, so bucket choice must not drift.
        assert_eq!(feature_hash("abc"), u64::from_le_bytes([0xba, 0x78, 0x16, 0xbf, 0x8f, 0x01, 0xcf, 0xea]));
    }

    #[test]
    fn test_blank_is_zero() {
        let e = HashingEmbedder::new(16);
        let v = e.embed("   ").unwrap();
        assert_eq!(v.len(), 16);
        assert!(v.iter().all(|&x| x == 0.0));
    }
}
