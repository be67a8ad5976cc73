//! # Nearest-neighbour search
//!
//! The knowledge-base linker only needs "build a flat inner-product index
//! over a fixed matrix, then ask for the top hit". `AnnProvider` builds,
//! `AnnIndex` searches. The bundled `FlatIpProvider` is exact brute force,
//! which is what a flat IP index is anyway.

use std::sync::Arc;

use crate::model::Matrix;
use crate::model::matrix::dot;
use crate::{Error, Result};

/// A searchable index over a fixed set of row vectors.
pub trait AnnIndex: Send + Sync {
    /// Number of indexed vectors.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Width of every indexed vector.
    fn dimension(&self) -> usize;

    /// Up to `k` `(row, score)` pairs, best first. Ties keep the lower row.
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>>;

    /// Best single hit, if the index is non-empty.
    fn search_top1(&self, query: &[f32]) -> Result<Option<(usize, f32)>> {
        Ok(self.search(query, 1)?.into_iter().next())
    }
}

/// Builds an [`AnnIndex`] from an embedding matrix.
pub trait AnnProvider: Send + Sync {
    fn kind(&self) -> &str;

    fn build(&self, embeddings: Matrix) -> Result<Arc<dyn AnnIndex>>;
}

// ============================================================================
// Flat inner-product
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct FlatIpProvider;

impl AnnProvider for FlatIpProvider {
    fn kind(&self) -> &str {
        "flat-ip"
    }

    fn build(&self, embeddings: Matrix) -> Result<Arc<dyn AnnIndex>> {
        Ok(Arc::new(FlatIpIndex::new(embeddings)))
    }
}

/// Exact inner-product search over every row.
#[derive(Debug, Clone)]
pub struct FlatIpIndex {
    embeddings: Matrix,
}

impl FlatIpIndex {
    pub fn new(embeddings: Matrix) -> Self {
        Self { embeddings }
    }
}

impl AnnIndex for FlatIpIndex {
    fn len(&self) -> usize {
        self.embeddings.rows()
    }

    fn dimension(&self) -> usize {
        self.embeddings.cols()
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
        if query.len() != self.dimension() {
            return Err(Error::DimensionMismatch { expected: self.dimension(), got: query.len() });
        }
        let mut scored: Vec<(usize, f32)> = self
            .embeddings
            .iter_rows()
            .enumerate()
            .map(|(i, row)| (i, dot(row, query)))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        scored.truncate(k);
        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> Arc<dyn AnnIndex> {
        let m = Matrix::from_rows(vec![
            vec![1.0, 0.0],
            vec![0.0, 1.0],
            vec![0.6, 0.8],
        ])
        .unwrap();
        FlatIpProvider.build(m).unwrap()
    }

    #[test]
    fn test_top1() {
        let idx = index();
        let (row, score) = idx.search_top1(&[0.0, 1.0]).unwrap().unwrap();
        assert_eq!(row, 1);
        assert!((score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_topk_order() {
        let idx = index();
        let hits = idx.search(&[1.0, 0.0], 3).unwrap();
        let rows: Vec<usize> = hits.iter().map(|h| h.0).collect();
        assert_eq!(rows, vec![0, 2, 1]);
    }

    #[test]
    fn test_empty_and_mismatch() {
        let empty = FlatIpProvider.build(Matrix::empty(2)).unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.search_top1(&[1.0, 0.0]).unwrap(), None);
        assert!(index().search(&[1.0], 1).is_err());
    }
}
