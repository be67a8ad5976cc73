//! Tier 0: hash-sharded exact alias dictionary.
//!
//! ```text
//! shard key  = hex(sha1(token))[..2]            (256 shards, case-sensitive token)
//! shard file = <shard_dir>/<key>.tsv             alias<TAB>canonical, one per line
//! lookup     = shard[key].get(token.to_lowercase())
//! ```
//!
//! Shards load on first touch and stay cached for the life of the handle.
//! The cache is bounded by the shard count, so there is no eviction. A
//! missing shard file is an empty shard.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::RwLock;
use sha1::{Digest, Sha1};

/// One loaded shard: lower-cased alias → canonical form.
pub type Shard = HashMap<String, String>;

pub struct ShardedExactDictionary {
    dir: PathBuf,
    cache: RwLock<HashMap<String, Arc<Shard>>>,
}

impl ShardedExactDictionary {
    pub const SHARD_COUNT: usize = 256;

    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), cache: RwLock::new(HashMap::new()) }
    }

    /// Two lowercase hex characters of the token's SHA-1, the layout
    /// existing alias dumps are partitioned by.
    pub fn shard_key(token: &str) -> String {
        let digest = Sha1::digest(token.as_bytes());
        format!("{:02x}", digest[0])
    }

    pub fn shard_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.tsv"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Exact lookup. `None` for unknown tokens and for empty canonicals.
    pub fn lookup(&self, token: &str) -> Option<String> {
        let shard = self.shard(&Self::shard_key(token));
        shard.get(&token.to_lowercase()).cloned()
    }

    /// Number of shards loaded so far.
    pub fn cached_shards(&self) -> usize {
        self.cache.read().len()
    }

    fn shard(&self, key: &str) -> Arc<Shard> {
        if let Some(shard) = self.cache.read().get(key) {
            return Arc::clone(shard);
        }

        // Loading outside the lock: two racing first loads read the same file
        // and the first insert wins, so the cache never holds a torn shard.
        let loaded = Arc::new(load_shard(&self.shard_path(key)));
        let mut cache = self.cache.write();
        Arc::clone(cache.entry(key.to_string()).or_insert(loaded))
    }
}

impl std::fmt::Debug for ShardedExactDictionary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShardedExactDictionary")
            .field("dir", &self.dir)
            .field("cached_shards", &self.cached_shards())
            .finish()
    }
}

fn load_shard(path: &Path) -> Shard {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Shard::new(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "alias shard unreadable, treating as empty");
            return Shard::new();
        }
    };

    let mut shard = Shard::new();
    let mut skipped = 0usize;
    for line in text.lines() {
        match line.split_once('\t') {
            Some((alias, canonical)) if !canonical.is_empty() => {
                shard.insert(alias.to_lowercase(), canonical.to_string());
            }
            _ if line.is_empty() => {}
            _ => skipped += 1,
        }
    }
    if skipped > 0 {
        tracing::warn!(path = %path.display(), skipped, "alias shard has malformed lines");
    }
    tracing::debug!(path = %path.display(), entries = shard.len(), "alias shard loaded");
    shard
}
