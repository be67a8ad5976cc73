//! # Sentence-graph model
//!
//! Plain DTOs shared by the resolvers, the encoder, the pipeline and the
//! store. No I/O here except [`Matrix`] file helpers.

pub mod edge;
pub mod hypervector;
pub mod matrix;
pub mod resolution;
pub mod triple;

pub use edge::{Edge, EdgeMeta, PredicateSource, SentenceId};
pub use hypervector::{Hypervector, PermuteTag};
pub use matrix::Matrix;
pub use resolution::{AliasTier, ResolutionResult};
pub use triple::Triple;
