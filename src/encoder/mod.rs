//! # Hyperdimensional edge encoder
//!
//! Each string is embedded, projected into `D` dimensions and sign-reduced
//! to a bipolar hypervector `E(x)`. Two vectors are produced per triple:
//!
//! ```text
//! surface  = bundle( RS ⊙ E(s), RP ⊙ E(p), RO ⊙ E(o) )
//! semantic = E(p) ⊙ bundle( permute(E(s), S), permute(E(o), O) )
//! ```
//!
//! `RS`, `RP`, `RO` are fixed bipolar role vectors derived from the role
//! seed. Role vectors, projection and embedder are all fixed at
//! construction, so `encode` is a pure function of its three inputs.

pub mod projection;

use std::sync::Arc;

use crate::embedding::EmbeddingProvider;
use crate::model::{Hypervector, PermuteTag};
use crate::{Error, Result};

pub use projection::ProjectionMatrix;

const ROLE_S_SALT: u64 = 0xDEADBEEF_CAFEBABE;
const ROLE_P_SALT: u64 = 0xFEEDFACE_DEADC0DE;
const ROLE_O_SALT: u64 = 0xBADC0FFE_E0DDF00D;

/// Subject, predicate and object role vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct RoleVectors {
    pub subject: Hypervector,
    pub predicate: Hypervector,
    pub object: Hypervector,
}

impl RoleVectors {
    pub fn new(dimension: usize, seed: u64) -> Self {
        Self {
            subject: Hypervector::random_bipolar(dimension, seed ^ ROLE_S_SALT),
            predicate: Hypervector::random_bipolar(dimension, seed ^ ROLE_P_SALT),
            object: Hypervector::random_bipolar(dimension, seed ^ ROLE_O_SALT),
        }
    }
}

/// The two vectors attached to an edge.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedEdge {
    pub surface: Hypervector,
    pub semantic: Hypervector,
}

pub struct HdEncoder {
    embedder: Arc<dyn EmbeddingProvider>,
    projection: Arc<ProjectionMatrix>,
    roles: RoleVectors,
}

impl HdEncoder {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        projection: Arc<ProjectionMatrix>,
        role_seed: u64,
    ) -> Result<Self> {
        if projection.embed_dim() != embedder.dimension() {
            return Err(Error::DimensionMismatch {
                expected: projection.embed_dim(),
                got: embedder.dimension(),
            });
        }
        let roles = RoleVectors::new(projection.dimension(), role_seed);
        Ok(Self { embedder, projection, roles })
    }

    /// Hypervector dimension `D`.
    pub fn dimension(&self) -> usize {
        self.projection.dimension()
    }

    pub fn roles(&self) -> &RoleVectors {
        &self.roles
    }

    /// `E(text)`: embed, project, sign-reduce.
    pub fn hypervector(&self, text: &str) -> Result<Hypervector> {
        let embedding = self.embedder.embed(text)?;
        self.projection.project(&embedding)
    }

    pub fn surface(&self, s: &Hypervector, p: &Hypervector, o: &Hypervector) -> Result<Hypervector> {
        let bs = self.roles.subject.bind(s)?;
        let bp = self.roles.predicate.bind(p)?;
        let bo = self.roles.object.bind(o)?;
        Hypervector::bundle(&[&bs, &bp, &bo])
    }

    pub fn semantic(&self, s: &Hypervector, p: &Hypervector, o: &Hypervector) -> Result<Hypervector> {
        let context = Hypervector::bundle(&[&s.permute(PermuteTag::Subject), &o.permute(PermuteTag::Object)])?;
        p.bind(&context)
    }

    pub fn encode(&self, subject: &str, predicate: &str, object: &str) -> Result<EncodedEdge> {
        let s = self.hypervector(subject)?;
        let p = self.hypervector(predicate)?;
        let o = self.hypervector(object)?;
        Ok(EncodedEdge {
            surface: self.surface(&s, &p, &o)?,
            semantic: self.semantic(&s, &p, &o)?,
        })
    }
}

impl std::fmt::Debug for HdEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HdEncoder")
            .field("embedder", &self.embedder.kind())
            .field("dimension", &self.dimension())
            .field("embed_dim", &self.projection.embed_dim())
            .finish()
    }
}
