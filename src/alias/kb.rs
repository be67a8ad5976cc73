//! Tier 2: global knowledge-base linker.
//!
//! The KB is an embedding matrix (`kb_emb.bin`, one row per entity) plus a
//! parallel id list (`kb_ids.txt`, one id per line). It loads lazily on the
//! first tier-2 query and stays loaded for the life of the handle.
//!
//! ```text
//! Unloaded ──first query──▶ Loaded(index, ids)
//!     │
//!     └──load error──▶ Failed          (warned once, never retried)
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::ann::{AnnIndex, AnnProvider};
use crate::embedding::EmbeddingProvider;
use crate::model::Matrix;
use crate::{Error, Result};

/// Tri-state load cell.
enum KbState {
    Unloaded,
    Loaded(Arc<LoadedKb>),
    Failed,
}

struct LoadedKb {
    index: Arc<dyn AnnIndex>,
    ids: Vec<String>,
}

/// A successful tier-2 link.
#[derive(Debug, Clone, PartialEq)]
pub struct KbHit {
    pub entity_id: String,
    pub similarity: f32,
}

pub struct GlobalEntityIndex {
    embeddings_path: PathBuf,
    ids_path: PathBuf,
    ann: Option<Arc<dyn AnnProvider>>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    threshold: f32,
    state: Mutex<KbState>,
}

impl GlobalEntityIndex {
    pub fn new(
        embeddings_path: impl Into<PathBuf>,
        ids_path: impl Into<PathBuf>,
        ann: Option<Arc<dyn AnnProvider>>,
        embedder: Option<Arc<dyn EmbeddingProvider>>,
        threshold: f32,
    ) -> Self {
        Self {
            embeddings_path: embeddings_path.into(),
            ids_path: ids_path.into(),
            ann,
            embedder,
            threshold,
            state: Mutex::new(KbState::Unloaded),
        }
    }

    /// Both collaborators present (the files may still be missing).
    pub fn is_available(&self) -> bool {
        self.ann.is_some() && self.embedder.is_some()
    }

    /// True once a load attempt has failed; the tier stays off for good.
    pub fn is_disabled(&self) -> bool {
        matches!(*self.state.lock(), KbState::Failed)
    }

    pub fn is_loaded(&self) -> bool {
        matches!(*self.state.lock(), KbState::Loaded(_))
    }

    /// 1-NN inner-product link; `None` below the similarity threshold or
    /// whenever the tier is unavailable. Never errors.
    pub fn link(&self, token: &str) -> Option<KbHit> {
        let (Some(ann), Some(embedder)) = (&self.ann, &self.embedder) else {
            return None;
        };
        let kb = self.loaded(ann.as_ref(), embedder.as_ref())?;

        let query = match embedder.embed(token) {
            Ok(q) => q,
            Err(e) => {
                tracing::warn!(token, error = %e, "KB query embedding failed");
                return None;
            }
        };
        let (row, similarity) = match kb.index.search_top1(&query) {
            Ok(Some(hit)) => hit,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(token, error = %e, "KB search failed");
                return None;
            }
        };
        if similarity < self.threshold {
            return None;
        }
        let entity_id = kb.ids.get(row)?.clone();
        Some(KbHit { entity_id, similarity })
    }

    /// Load on first use; the lock is held across the load so only one
    /// caller does the work and everyone else sees the final state.
    fn loaded(&self, ann: &dyn AnnProvider, embedder: &dyn EmbeddingProvider) -> Option<Arc<LoadedKb>> {
        let mut state = self.state.lock();
        match &*state {
            KbState::Loaded(kb) => return Some(Arc::clone(kb)),
            KbState::Failed => return None,
            KbState::Unloaded => {}
        }

        match load_kb(&self.embeddings_path, &self.ids_path, ann, embedder.dimension()) {
            Ok(kb) => {
                tracing::info!(entities = kb.ids.len(), ann = ann.kind(), "knowledge base loaded");
                let kb = Arc::new(kb);
                *state = KbState::Loaded(Arc::clone(&kb));
                Some(kb)
            }
            Err(e) => {
                tracing::warn!(error = %e, "KB load failed; tier 2 disabled");
                *state = KbState::Failed;
                None
            }
        }
    }
}

impl std::fmt::Debug for GlobalEntityIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match *self.state.lock() {
            KbState::Unloaded => "unloaded",
            KbState::Loaded(_) => "loaded",
            KbState::Failed => "failed",
        };
        f.debug_struct("GlobalEntityIndex")
            .field("embeddings_path", &self.embeddings_path)
            .field("available", &self.is_available())
            .field("state", &state)
            .finish()
    }
}

fn load_kb(
    embeddings_path: &Path,
    ids_path: &Path,
    ann: &dyn AnnProvider,
    expected_dim: usize,
) -> Result<LoadedKb> {
    let embeddings = Matrix::load(embeddings_path)?;
    let ids: Vec<String> = std::fs::read_to_string(ids_path)?
        .lines()
        .map(str::to_string)
        .collect();

    if ids.len() != embeddings.rows() {
        return Err(Error::CorruptResource {
            path: ids_path.display().to_string(),
            message: format!("{} ids for {} embedding rows", ids.len(), embeddings.rows()),
        });
    }
    if embeddings.cols() != expected_dim {
        return Err(Error::DimensionMismatch { expected: expected_dim, got: embeddings.cols() });
    }

    let index = ann.build(embeddings)?;
    Ok(LoadedKb { index, ids })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ann::FlatIpProvider;
    use crate::embedding::HashingEmbedder;

    fn write_kb(dir: &Path, names: &[&str], ids: &[&str], embedder: &HashingEmbedder) {
        let rows = names.iter().map(|n| embedder.embed(n).unwrap()).collect();
        Matrix::from_rows(rows).unwrap().save(&dir.join("kb_emb.bin")).unwrap();
        std::fs::write(dir.join("kb_ids.txt"), ids.join("\n")).unwrap();
    }

    fn index(dir: &Path) -> GlobalEntityIndex {
        GlobalEntityIndex::new(
            dir.join("kb_emb.bin"),
            dir.join("kb_ids.txt"),
            Some(Arc::new(FlatIpProvider)),
            Some(Arc::new(HashingEmbedder::default())),
            0.6,
        )
    }

    #[test]
    fn test_link_hit_and_miss() {
        let dir = tempfile::tempdir().unwrap();
        write_kb(dir.path(), &["Globex", "Initech"], &["Q1", "Q2"], &HashingEmbedder::default());
        let kb = index(dir.path());

        let hit = kb.link("Initech").unwrap();
        assert_eq!(hit.entity_id, "Q2");
        assert!(hit.similarity > 0.99);
        assert!(kb.link("completely unrelated words").is_none());
        assert!(kb.is_loaded());
    }

    #[test]
    fn test_racing_first_links_load_once() {
        let dir = tempfile::tempdir().unwrap();
        write_kb(dir.path(), &["Globex", "Initech"], &["Q1", "Q2"], &HashingEmbedder::default());
        let kb = Arc::new(index(dir.path()));
        assert!(!kb.is_loaded());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let kb = Arc::clone(&kb);
                let name = if i % 2 == 0 { "Globex" } else { "Initech" };
                std::thread::spawn(move || (name, (0..20).map(|_| kb.link(name)).collect::<Vec<_>>()))
            })
            .collect();
        for handle in handles {
            let (name, hits) = handle.join().unwrap();
            let expected = if name == "Globex" { "Q1" } else { "Q2" };
            assert!(hits.iter().all(|h| h.as_ref().map(|h| h.entity_id.as_str()) == Some(expected)));
        }
        assert!(kb.is_loaded());
        assert!(!kb.is_disabled());
    }

    #[test]
    fn test_missing_files_disable_permanently() {
        let dir = tempfile::tempdir().unwrap();
        let kb = index(dir.path());
        assert!(kb.link("Globex").is_none());
        assert!(kb.is_disabled());

        // Files appearing later are ignored: failure is memoised.
        write_kb(dir.path(), &["Globex"], &["Q1"], &HashingEmbedder::default());
        assert!(kb.link("Globex").is_none());
    }

    #[test]
    fn test_id_count_mismatch_fails_load() {
        let dir = tempfile::tempdir().unwrap();
        write_kb(dir.path(), &["Globex", "Initech"], &["Q1"], &HashingEmbedder::default());
        let kb = index(dir.path());
        assert!(kb.link("Globex").is_none());
        assert!(kb.is_disabled());
    }

    #[test]
    fn test_dimension_mismatch_fails_load() {
        let dir = tempfile::tempdir().unwrap();
        write_kb(dir.path(), &["Globex"], &["Q1"], &HashingEmbedder::new(16));
        let kb = index(dir.path());
        assert!(kb.link("Globex").is_none());
        assert!(kb.is_disabled());
    }

    #[test]
    fn test_unavailable_without_ann() {
        let dir = tempfile::tempdir().unwrap();
        write_kb(dir.path(), &["Globex"], &["Q1"], &HashingEmbedder::default());
        let kb = GlobalEntityIndex::new(
            dir.path().join("kb_emb.bin"),
            dir.path().join("kb_ids.txt"),
            None,
            Some(Arc::new(HashingEmbedder::default())),
            0.6,
        );
        assert!(!kb.is_available());
        assert!(kb.link("Globex").is_none());
        assert!(!kb.is_disabled());
    }
}
