//! Versioned in-memory contents of tracked files

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::DraftError;

/// Snapshot of a tracked file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub contents: Arc<str>,
    pub version: u64,
}

/// Closed files keep their last version as a tombstone so a reopened file
/// never reuses a version number an in-flight rebuild was started with. The
/// tombstone is pruned once no queued task can still hold its versions.
#[derive(Debug)]
struct DraftEntry {
    contents: Option<Arc<str>>,
    version: u64,
}

/// Thread-safe map from path to current draft
#[derive(Debug, Default)]
pub struct DraftStore {
    drafts: Mutex<HashMap<PathBuf, DraftEntry>>,
}

impl DraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PathBuf, DraftEntry>> {
        self.drafts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the contents of `path`, returning the new version
    pub fn upsert(&self, path: &Path, contents: &str) -> u64 {
        let mut drafts = self.lock();
        let entry = drafts.entry(path.to_path_buf()).or_insert(DraftEntry {
            contents: None,
            version: 0,
        });
        entry.version += 1;
        entry.contents = Some(Arc::from(contents));
        entry.version
    }

    /// Stop tracking `path`, returning the tombstone version, or `None` if it
    /// was not tracked.
    pub fn remove(&self, path: &Path) -> Option<u64> {
        let mut drafts = self.lock();
        match drafts.get_mut(path) {
            Some(entry) if entry.contents.is_some() => {
                entry.contents = None;
                entry.version += 1;
                Some(entry.version)
            }
            _ => None,
        }
    }

    /// Forget the tombstone left by `remove` if it is still at `version`.
    /// A reopened or removed-again path is kept.
    pub fn prune(&self, path: &Path, version: u64) -> bool {
        let mut drafts = self.lock();
        let is_tombstone = drafts
            .get(path)
            .is_some_and(|entry| entry.contents.is_none() && entry.version == version);
        if is_tombstone {
            drafts.remove(path);
        }
        is_tombstone
    }

    /// Number of entries, tombstones included
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn read(&self, path: &Path) -> Result<Draft, DraftError> {
        self.lock()
            .get(path)
            .and_then(|entry| {
                entry.contents.as_ref().map(|contents| Draft {
                    contents: Arc::clone(contents),
                    version: entry.version,
                })
            })
            .ok_or_else(|| DraftError::NotTracked(path.to_path_buf()))
    }

    /// Current version of a tracked file
    pub fn version(&self, path: &Path) -> Option<u64> {
        self.lock()
            .get(path)
            .filter(|entry| entry.contents.is_some())
            .map(|entry| entry.version)
    }

    pub fn is_tracked(&self, path: &Path) -> bool {
        self.version(path).is_some()
    }

    pub fn tracked_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = self
            .lock()
            .iter()
            .filter(|(_, entry)| entry.contents.is_some())
            .map(|(path, _)| path.clone())
            .collect();
        files.sort();
        files
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_versions_count_upserts() {
        let store = DraftStore::new();
        let path = Path::new("a.cc");

        for n in 1..=5 {
            let version = store.upsert(path, &format!("int x{};", n));
            assert_eq!(version, n);
        }

        let draft = store.read(path).unwrap();
        assert_eq!(draft.version, 5);
        assert_eq!(&*draft.contents, "int x5;");
    }

    #[test]
    fn test_remove_and_not_tracked() {
        let store = DraftStore::new();
        let path = Path::new("a.cc");

        assert_eq!(store.remove(path), None);
        assert!(matches!(store.read(path), Err(DraftError::NotTracked(_))));

        store.upsert(path, "int x;");
        assert!(store.is_tracked(path));
        assert_eq!(store.remove(path), Some(2));
        assert_eq!(store.remove(path), None);
        assert!(!store.is_tracked(path));
        assert!(store.read(path).is_err());
        assert!(store.tracked_files().is_empty());
    }

    #[test]
    fn test_reopen_never_reuses_version() {
        let store = DraftStore::new();
        let path = Path::new("a.cc");

        assert_eq!(store.upsert(path, "one"), 1);
        store.remove(path);
        let reopened = store.upsert(path, "two");
        assert!(reopened > 1);
        assert_eq!(store.version(path), Some(reopened));
    }

    #[test]
    fn test_prune_only_matching_tombstone() {
        let store = DraftStore::new();
        let path = Path::new("a.cc");

        store.upsert(path, "one");
        let first = store.remove(path).unwrap();
        store.upsert(path, "two");
        assert!(!store.prune(path, first));
        assert!(store.is_tracked(path));

        let second = store.remove(path).unwrap();
        assert!(!store.prune(path, first));
        assert_eq!(store.len(), 1);
        assert!(store.prune(path, second));
        assert!(store.is_empty());
        assert!(!store.prune(path, second));

        assert_eq!(store.upsert(path, "three"), 1);
    }

    #[test]
    fn test_tracked_files_sorted() {
        let store = DraftStore::new();
        store.upsert(Path::new("b.cc"), "");
        store.upsert(Path::new("a.cc"), "");
        assert_eq!(
            store.tracked_files(),
            vec![PathBuf::from("a.cc"), PathBuf::from("b.cc")]
        );
    }

    #[test]
    fn test_concurrent_upserts_are_serialized() {
        let store = Arc::new(DraftStore::new());
        let path = PathBuf::from("shared.cc");

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                let path = path.clone();
                thread::spawn(move || {
                    for _ in 0..50 {
                        store.upsert(&path, &format!("writer {}", i));
                        let draft = store.read(&path).unwrap();
                        assert!(draft.contents.starts_with("writer "));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.version(&path), Some(400));
    }
}
