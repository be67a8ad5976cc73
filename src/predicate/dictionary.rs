//! Persistent predicate → abstract-type dictionary.
//!
//! Write-through: the in-memory map is authoritative and every new entry is
//! flushed to disk (temp file + rename) before the lock is released. The
//! file is a pretty-printed JSON object, sorted by key.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::{Error, Result};

pub struct PredicateDictionary {
    path: Option<PathBuf>,
    entries: Mutex<BTreeMap<String, String>>,
}

impl PredicateDictionary {
    /// Open (or start) the dictionary at `path`. A missing file is an empty
    /// dictionary; an unreadable or non-JSON file is an error so it is never
    /// overwritten by the next flush.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => BTreeMap::new(),
            Ok(text) => serde_json::from_str(&text).map_err(|e| Error::CorruptResource {
                path: path.display().to_string(),
                message: e.to_string(),
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        tracing::info!(path = %path.display(), entries = entries.len(), "predicate dictionary opened");
        Ok(Self { path: Some(path), entries: Mutex::new(entries) })
    }

    /// Memory-only dictionary; inserts are never flushed.
    pub fn in_memory() -> Self {
        Self { path: None, entries: Mutex::new(BTreeMap::new()) }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn get(&self, predicate: &str) -> Option<String> {
        self.entries.lock().get(predicate).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Distinct abstract types currently mapped to.
    pub fn abstracts(&self) -> Vec<String> {
        let mut out: Vec<String> = self.entries.lock().values().cloned().collect();
        out.sort();
        out.dedup();
        out
    }

    pub fn has_abstract(&self, abstract_type: &str) -> bool {
        self.entries.lock().values().any(|v| v == abstract_type)
    }

    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.entries.lock().clone()
    }

    /// Map an unseen `predicate` to `abstract_type` and flush, all under one
    /// lock. Keys are never remapped: if another writer got there first, its
    /// value is returned unchanged and nothing is written. On a failed flush
    /// the in-memory entry is rolled back.
    pub fn get_or_insert(&self, predicate: &str, abstract_type: &str) -> Result<String> {
        let mut entries = self.entries.lock();
        if let Some(existing) = entries.get(predicate) {
            return Ok(existing.clone());
        }
        entries.insert(predicate.to_string(), abstract_type.to_string());
        if let Err(e) = self.flush(&entries) {
            entries.remove(predicate);
            return Err(e);
        }
        Ok(abstract_type.to_string())
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let persistence = |message: String| Error::Persistence {
            path: path.display().to_string(),
            message,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| persistence(e.to_string()))?;
        }
        let json = serde_json::to_string_pretty(entries).map_err(|e| persistence(e.to_string()))?;

        let tmp = path.with_extension("json.tmp");
        let mut file = std::fs::File::create(&tmp).map_err(|e| persistence(e.to_string()))?;
        file.write_all(json.as_bytes()).map_err(|e| persistence(e.to_string()))?;
        file.sync_all().map_err(|e| persistence(e.to_string()))?;
        std::fs::rename(&tmp, path).map_err(|e| persistence(e.to_string()))
    }
}

impl std::fmt::Debug for PredicateDictionary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredicateDictionary")
            .field("path", &self.path)
            .field("entries", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_flushes_and_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("edge_types.json");

        let dict = PredicateDictionary::open(&path).unwrap();
        assert!(dict.is_empty());
        dict.get_or_insert("purchased", "acquired_by").unwrap();
        assert!(path.exists());

        let reopened = PredicateDictionary::open(&path).unwrap();
        assert_eq!(reopened.get("purchased").as_deref(), Some("acquired_by"));
    }

    #[test]
    fn test_corrupt_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("edge_types.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(PredicateDictionary::open(&path), Err(Error::CorruptResource { .. })));
    }

    #[test]
    fn test_flush_failure_rolls_back() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should be makes the rename fail.
        let path = dir.path().join("edge_types.json");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep"), "x").unwrap();
        let dict = PredicateDictionary { path: Some(path), entries: Mutex::new(BTreeMap::new()) };

        let err = dict.get_or_insert("bought", "acquired_by").unwrap_err();
        assert!(matches!(err, Error::Persistence { .. }));
        assert_eq!(dict.get("bought"), None);
    }

    #[test]
    fn test_abstracts_distinct_sorted() {
        let dict = PredicateDictionary::in_memory();
        dict.get_or_insert("bought", "acquired_by").unwrap();
        dict.get_or_insert("purchased", "acquired_by").unwrap();
        dict.get_or_insert("started", "founded_by").unwrap();
        assert_eq!(dict.abstracts(), vec!["acquired_by", "founded_by"]);
    }

    #[test]
    fn test_existing_key_never_remapped() {
        let dict = PredicateDictionary::in_memory();
        assert_eq!(dict.get_or_insert("bought", "acquired_by").unwrap(), "acquired_by");
        assert_eq!(dict.get_or_insert("bought", "purchased_by").unwrap(), "acquired_by");
        assert_eq!(dict.len(), 1);
    }
}
