//! File system access for unit builds
//!
//! Builds never touch the disk directly; they resolve includes through a
//! `FileSystemProvider` supplied to the session.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

pub trait FileSystemProvider: Send + Sync {
    /// Whether `path` names a readable regular file
    fn exists(&self, path: &Path) -> bool;
}

/// Queries the host file system
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFileSystem;

impl FileSystemProvider for RealFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}

/// Thread-safe in-memory file map
#[derive(Debug, Default)]
pub struct InMemoryFileSystem {
    files: RwLock<HashMap<PathBuf, String>>,
}

impl InMemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_files<I, P, S>(files: I) -> Self
    where
        I: IntoIterator<Item = (P, S)>,
        P: Into<PathBuf>,
        S: Into<String>,
    {
        let fs = Self::new();
        for (path, contents) in files {
            fs.insert(path, contents);
        }
        fs
    }

    pub fn insert(&self, path: impl Into<PathBuf>, contents: impl Into<String>) {
        self.files
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.into(), contents.into());
    }

    pub fn remove(&self, path: &Path) -> bool {
        self.files
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(path)
            .is_some()
    }
}

impl FileSystemProvider for InMemoryFileSystem {
    fn exists(&self, path: &Path) -> bool {
        self.files
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_insert_and_remove() {
        let fs = InMemoryFileSystem::with_files([("/src/a.h", "int a;")]);
        assert!(fs.exists(Path::new("/src/a.h")));
        assert!(!fs.exists(Path::new("/src/b.h")));

        fs.insert("/src/b.h", "int b;");
        assert!(fs.exists(Path::new("/src/b.h")));

        assert!(fs.remove(Path::new("/src/a.h")));
        assert!(!fs.remove(Path::new("/src/a.h")));
        assert!(!fs.exists(Path::new("/src/a.h")));
    }

    #[test]
    fn test_real_file_system() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.h");
        std::fs::write(&path, "#pragma once\n").unwrap();

        assert!(RealFileSystem.exists(&path));
        assert!(!RealFileSystem.exists(dir.path()));
        assert!(!RealFileSystem.exists(&dir.path().join("missing.h")));
    }
}
