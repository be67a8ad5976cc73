//! Fixed random projection from embedding space to hypervector space.
//!
//! A `D × embed_dim` matrix of standard-normal draws from a seeded
//! ChaCha8 stream, rows scaled to unit length. Generated once, written to
//! disk, and reused on every later start so vectors stay comparable across
//! runs.

use std::path::Path;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};

use crate::model::{Hypervector, Matrix};
use crate::{Error, Result};

const ROW_NORM_EPS: f32 = 1e-6;

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionMatrix {
    matrix: Matrix,
}

impl ProjectionMatrix {
    /// Deterministic `dimension × embed_dim` projection for `seed`.
    pub fn generate(dimension: usize, embed_dim: usize, seed: u64) -> Result<Self> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let data: Vec<f32> = (0..dimension * embed_dim)
            .map(|_| StandardNormal.sample(&mut rng))
            .collect();
        let mut matrix = Matrix::new(dimension, embed_dim, data)?;
        matrix.normalize_rows(ROW_NORM_EPS);
        Ok(Self { matrix })
    }

    /// Reuse the matrix at `path` or create and persist a fresh one.
    ///
    /// An existing file with the wrong shape or undecodable content is an
    /// error. A failed first write is only logged: the in-memory matrix is
    /// still valid for this process.
    pub fn load_or_create(path: &Path, dimension: usize, embed_dim: usize, seed: u64) -> Result<Self> {
        if path.exists() {
            let matrix = Matrix::load(path)?;
            if matrix.rows() != dimension || matrix.cols() != embed_dim {
                return Err(Error::CorruptResource {
                    path: path.display().to_string(),
                    message: format!(
                        "projection is {}×{}, expected {dimension}×{embed_dim}",
                        matrix.rows(),
                        matrix.cols()
                    ),
                });
            }
            tracing::info!(path = %path.display(), dimension, embed_dim, "projection matrix loaded");
            return Ok(Self { matrix });
        }

        let projection = Self::generate(dimension, embed_dim, seed)?;
        match projection.matrix.save(path) {
            Ok(()) => tracing::info!(path = %path.display(), dimension, embed_dim, "projection matrix created"),
            Err(e) => tracing::warn!(error = %e, "projection matrix not persisted; using in-memory copy"),
        }
        Ok(projection)
    }

    pub fn dimension(&self) -> usize {
        self.matrix.rows()
    }

    pub fn embed_dim(&self) -> usize {
        self.matrix.cols()
    }

    pub fn matrix(&self) -> &Matrix {
        &self.matrix
    }

    /// `sign(P · embedding)`.
    pub fn project(&self, embedding: &[f32]) -> Result<Hypervector> {
        Ok(Hypervector::from_signs(&self.matrix.matvec(embedding)?))
    }
}
