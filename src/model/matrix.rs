//! Dense row-major `f32` matrix, persisted as bincode.
//!
//! Used for the encoder's random projection and for the knowledge-base
//! embedding table. Both files are written once and read many times.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl Matrix {
    pub fn new(rows: usize, cols: usize, data: Vec<f32>) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::DimensionMismatch { expected: rows * cols, got: data.len() });
        }
        Ok(Self { rows, cols, data })
    }

    /// Zero rows of the given width.
    pub fn empty(cols: usize) -> Self {
        Self { rows: 0, cols, data: Vec::new() }
    }

    /// Stack equally sized rows.
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self> {
        let cols = rows.first().map(Vec::len).unwrap_or(0);
        let n = rows.len();
        let mut data = Vec::with_capacity(n * cols);
        for row in rows {
            if row.len() != cols {
                return Err(Error::DimensionMismatch { expected: cols, got: row.len() });
            }
            data.extend(row);
        }
        Ok(Self { rows: n, cols, data })
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn row(&self, i: usize) -> &[f32] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[f32]> {
        // chunks_exact(0) panics; an empty matrix simply has no rows
        self.data.chunks_exact(self.cols.max(1)).take(self.rows)
    }

    /// `self · v`, one dot product per row.
    pub fn matvec(&self, v: &[f32]) -> Result<Vec<f32>> {
        if v.len() != self.cols {
            return Err(Error::DimensionMismatch { expected: self.cols, got: v.len() });
        }
        Ok(self.iter_rows().map(|row| dot(row, v)).collect())
    }

    /// Scale each row to unit length (`+ eps` guards all-zero rows).
    pub fn normalize_rows(&mut self, eps: f32) {
        let cols = self.cols.max(1);
        for row in self.data.chunks_exact_mut(cols) {
            let norm = row.iter().map(|x| x * x).sum::<f32>().sqrt() + eps;
            for x in row.iter_mut() {
                *x /= norm;
            }
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let matrix: Matrix = bincode::deserialize_from(BufReader::new(file))
            .map_err(|e| Error::CorruptResource {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        if matrix.rows.checked_mul(matrix.cols) != Some(matrix.data.len()) {
            return Err(Error::CorruptResource {
                path: path.display().to_string(),
                message: format!(
                    "header says {}×{} but payload holds {} values",
                    matrix.rows, matrix.cols, matrix.data.len()
                ),
            });
        }
        Ok(matrix)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let persistence = |message: String| Error::Persistence {
            path: path.display().to_string(),
            message,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| persistence(e.to_string()))?;
        }
        let file = File::create(path).map_err(|e| persistence(e.to_string()))?;
        let mut writer = BufWriter::new(file);
        bincode::serialize_into(&mut writer, self).map_err(|e| persistence(e.to_string()))?;
        writer.flush().map_err(|e| persistence(e.to_string()))
    }
}

#[inline]
pub(crate) fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matvec() {
        let m = Matrix::new(2, 3, vec![1.0, 0.0, 0.0, 0.0, 2.0, 1.0]).unwrap();
        assert_eq!(m.matvec(&[3.0, 1.0, 1.0]).unwrap(), vec![3.0, 3.0]);
        assert!(m.matvec(&[1.0]).is_err());
    }

    #[test]
    fn test_from_rows_rejects_ragged() {
        assert!(Matrix::from_rows(vec![vec![1.0, 2.0], vec![1.0]]).is_err());
        let empty = Matrix::from_rows(Vec::new()).unwrap();
        assert_eq!(empty.rows(), 0);
        assert_eq!(empty.iter_rows().count(), 0);
    }

    #[test]
    fn test_normalize_rows() {
        let mut m = Matrix::new(1, 2, vec![3.0, 4.0]).unwrap();
        m.normalize_rows(0.0);
        assert!((m.row(0)[0] - 0.6).abs() < 1e-6);
        assert!((m.row(0)[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("m.bin");
        let m = Matrix::new(2, 2, vec![0.5, -0.5, 1.0, 2.0]).unwrap();
        m.save(&path).unwrap();
        assert_eq!(Matrix::load(&path).unwrap(), m);
    }

    #[test]
    fn test_load_garbage_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.bin");
        std::fs::write(&path, b"not a matrix").unwrap();
        assert!(matches!(Matrix::load(&path), Err(Error::CorruptResource { .. })));
    }
}
