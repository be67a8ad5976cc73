//! # Embedding providers
//!
//! A provider maps text to a fixed-length, unit-normalised `f32` vector.
//! Providers are optional for the alias cascade (tiers 1 and 2) but the
//! hypervector encoder cannot run without one.
//!
//! | Provider | Feature | Description |
//! |----------|---------|-------------|
//! | `HashingEmbedder` | (always) | Deterministic character-trigram feature hashing |
//! | `ApiEmbedder` | `http` | OpenAI-compatible `/embeddings` endpoint |

pub mod hashing;
#[cfg(feature = "http")]
pub mod api;

use std::sync::Arc;

use crate::Result;

pub use hashing::HashingEmbedder;
#[cfg(feature = "http")]
pub use api::{ApiEmbedder, ApiEmbedderConfig};

/// Text → unit-length vector.
pub trait EmbeddingProvider: Send + Sync {
    /// Short provider name for logs.
    fn kind(&self) -> &str;

    /// Output dimension.
    fn dimension(&self) -> usize;

    /// Embed one string. The result has `dimension()` entries and unit norm
    /// (or is all zeros for input with no features).
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed many strings. Default: one call per string.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }
}

impl<P: EmbeddingProvider + ?Sized> EmbeddingProvider for Arc<P> {
    fn kind(&self) -> &str {
        (**self).kind()
    }

    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        (**self).embed(text)
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        (**self).embed_batch(texts)
    }
}

/// Scale to unit L2 norm in place. All-zero vectors are left untouched.
pub fn normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

// ============================================================================
// Capability detection
// ============================================================================

/// Which optional heavy collaborators are present. Computed once at build time
/// and consulted by the alias tiers instead of probing per call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub has_embeddings: bool,
    pub has_ann: bool,
}

impl Capabilities {
    pub fn detect(has_embeddings: bool, has_ann: bool) -> Self {
        Self { has_embeddings, has_ann }
    }

    /// Tier 1 needs an embedding provider (and, per call, document context).
    pub fn fuzzy_enabled(&self) -> bool {
        self.has_embeddings
    }

    /// Tier 2 needs both an embedding provider and an ANN provider.
    pub fn global_enabled(&self) -> bool {
        self.has_embeddings && self.has_ann
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        let mut v = vec![3.0, 0.0, 4.0];
        normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[2] - 0.8).abs() < 1e-6);

        let mut zero = vec![0.0; 4];
        normalize(&mut zero);
        assert!(zero.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_capabilities() {
        let none = Capabilities::default();
        assert!(!none.fuzzy_enabled());
        assert!(!none.global_enabled());

        let emb_only = Capabilities::detect(true, false);
        assert!(emb_only.fuzzy_enabled());
        assert!(!emb_only.global_enabled());

        assert!(Capabilities::detect(true, true).global_enabled());
        assert!(!Capabilities::detect(false, true).global_enabled());
    }
}
