//! Ternary hypervectors and the bind / bundle / permute algebra.
//!
//! Every element lives in `{-1, 0, +1}`. Role vectors and projected
//! embeddings are strictly bipolar; zeros only appear where a bundle's
//! summands cancel out or a projection lands exactly on 0.0.
//!
//! ```text
//! bind(r, f)      = r ⊙ f                  (element-wise product)
//! bundle(a, b, …) = sign(a + b + …)        (clipped, never re-normalised)
//! permute(v, S)   = rotate_right(v, 1)
//! permute(v, O)   = reverse(v)
//! ```

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Positional tag for [`Hypervector::permute`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PermuteTag {
    /// Subject position: one-step circular rotation.
    Subject,
    /// Object position: full reversal.
    Object,
}

/// Fixed-dimension vector over `{-1, 0, +1}`.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<i8>")]
pub struct Hypervector(Vec<i8>);

impl Hypervector {
    /// All-zero vector of the given dimension.
    pub fn zeros(dim: usize) -> Self {
        Self(vec![0; dim])
    }

    /// Wrap raw ternary values. Anything outside `{-1, 0, +1}` is clipped.
    pub fn from_values(values: Vec<i8>) -> Self {
        Self(values.into_iter().map(i8::signum).collect())
    }

    /// Sign-reduce a real vector (ties → 0).
    pub fn from_signs(values: &[f32]) -> Self {
        Self(values.iter().map(|&v| sign_f32(v)).collect())
    }

    /// Deterministic pseudo-random bipolar vector (SplitMix64 seed + xorshift64 stream).
    ///
    /// Same `(dim, seed)` always yields the same vector, across runs and platforms.
    pub fn random_bipolar(dim: usize, seed: u64) -> Self {
        let mut z = seed.wrapping_add(0x9e3779b97f4a7c15);
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
        let mut state = (z ^ (z >> 31)) | 1;

        let mut values = Vec::with_capacity(dim);
        let mut word = 0u64;
        for i in 0..dim {
            if i % 64 == 0 {
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                word = state;
            }
            values.push(if (word >> (i % 64)) & 1 == 1 { 1 } else { -1 });
        }
        Self(values)
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn as_slice(&self) -> &[i8] {
        &self.0
    }

    /// Element-wise product: "this filler plays this role".
    pub fn bind(&self, other: &Hypervector) -> Result<Hypervector> {
        check_dims(self.dim(), other.dim())?;
        Ok(Self(self.0.iter().zip(&other.0).map(|(a, b)| a * b).collect()))
    }

    /// Element-wise sum of all inputs, sign-truncated back into `{-1, 0, +1}`.
    pub fn bundle(vectors: &[&Hypervector]) -> Result<Hypervector> {
        let Some(first) = vectors.first() else {
            return Err(Error::DimensionMismatch { expected: 1, got: 0 });
        };
        let dim = first.dim();
        let mut sums = vec![0i32; dim];
        for v in vectors {
            check_dims(dim, v.dim())?;
            for (acc, &x) in sums.iter_mut().zip(&v.0) {
                *acc += i32::from(x);
            }
        }
        Ok(Self(sums.into_iter().map(|s| s.signum() as i8).collect()))
    }

    /// Structural transform that separates subject from object context.
    pub fn permute(&self, tag: PermuteTag) -> Hypervector {
        let mut out = self.0.clone();
        match tag {
            PermuteTag::Subject => out.rotate_right(1),
            PermuteTag::Object => out.reverse(),
        }
        Self(out)
    }

    /// Cosine similarity; 0.0 when either side is all zeros.
    pub fn cosine(&self, other: &Hypervector) -> f32 {
        if self.dim() != other.dim() {
            return 0.0;
        }
        let mut dot = 0i64;
        let mut na = 0i64;
        let mut nb = 0i64;
        for (&a, &b) in self.0.iter().zip(&other.0) {
            dot += i64::from(a) * i64::from(b);
            na += i64::from(a) * i64::from(a);
            nb += i64::from(b) * i64::from(b);
        }
        if na == 0 || nb == 0 {
            return 0.0;
        }
        dot as f32 / ((na as f32).sqrt() * (nb as f32).sqrt())
    }

    /// Fraction of positions holding the same value.
    pub fn agreement(&self, other: &Hypervector) -> f32 {
        if self.dim() != other.dim() || self.dim() == 0 {
            return 0.0;
        }
        let same = self.0.iter().zip(&other.0).filter(|(a, b)| a == b).count();
        same as f32 / self.dim() as f32
    }

    /// Number of zero positions.
    pub fn zero_count(&self) -> usize {
        self.0.iter().filter(|&&v| v == 0).count()
    }
}

/// Strict counterpart of [`Hypervector::from_values`]: out-of-range values
/// are rejected, not clipped. Deserialisation goes through here.
impl TryFrom<Vec<i8>> for Hypervector {
    type Error = String;

    fn try_from(values: Vec<i8>) -> std::result::Result<Self, Self::Error> {
        match values.iter().position(|v| !(-1..=1).contains(v)) {
            Some(i) => Err(format!("hypervector value {} at position {i} is outside {{-1, 0, +1}}", values[i])),
            None => Ok(Self(values)),
        }
    }
}

impl std::fmt::Debug for Hypervector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let pos = self.0.iter().filter(|&&v| v > 0).count();
        write!(f, "Hypervector(dim={}, +{}, 0×{})", self.dim(), pos, self.zero_count())
    }
}

#[inline]
fn sign_f32(v: f32) -> i8 {
    if v > 0.0 {
        1
    } else if v < 0.0 {
        -1
    } else {
        0
    }
}

fn check_dims(expected: usize, got: usize) -> Result<()> {
    if expected != got {
        return Err(Error::DimensionMismatch { expected, got });
    }
    Ok(())
}
