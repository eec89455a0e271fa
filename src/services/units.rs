//! Built analysis units and their cache
//!
//! The cache only decides storage and replacement; construction belongs to
//! the `UnitBuilder` capability. Entries are keyed 1:1 with tracked files and
//! removed exactly when a file stops being tracked.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::BuildError;
use crate::models::diagnostic::{Diagnostic, DiagnosticSeverity};

/// Opaque build output kept alive for the lifetime of a unit
pub trait UnitHandle: Send + Sync {
    /// Textual rendering of the unit's internal state
    fn dump(&self) -> String;
}

pub struct Unit {
    path: PathBuf,
    source_version: u64,
    diagnostics: Vec<Diagnostic>,
    handle: Option<Box<dyn UnitHandle>>,
}

impl Unit {
    pub fn new(
        path: impl Into<PathBuf>,
        source_version: u64,
        diagnostics: Vec<Diagnostic>,
        handle: Option<Box<dyn UnitHandle>>,
    ) -> Self {
        Self {
            path: path.into(),
            source_version,
            diagnostics,
            handle,
        }
    }

    /// A unit for a build that produced nothing usable but the failure itself
    pub fn failed(path: impl Into<PathBuf>, source_version: u64, error: &BuildError) -> Self {
        let severity = match error {
            BuildError::UnsupportedLanguage(_) => DiagnosticSeverity::Warning,
            _ => DiagnosticSeverity::Error,
        };
        let diagnostic = Diagnostic::file_level(severity, error.to_string()).with_source("weft");
        Self::new(path, source_version, vec![diagnostic], None)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn source_version(&self) -> u64 {
        self.source_version
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn has_handle(&self) -> bool {
        self.handle.is_some()
    }

    pub fn dump(&self) -> String {
        self.handle
            .as_ref()
            .map(|handle| handle.dump())
            .unwrap_or_else(|| "<no build output>".to_string())
    }
}

impl std::fmt::Debug for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Unit")
            .field("path", &self.path)
            .field("source_version", &self.source_version)
            .field("diagnostics", &self.diagnostics.len())
            .field("has_handle", &self.handle.is_some())
            .finish()
    }
}

/// Thread-safe map from path to most recent unit
///
/// Readers receive an `Arc`, so a replaced unit's handle is released once the
/// last in-flight reader drops it.
#[derive(Default)]
pub struct UnitStore {
    units: Mutex<HashMap<PathBuf, Arc<Unit>>>,
}

impl UnitStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PathBuf, Arc<Unit>>> {
        self.units.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, path: &Path) -> Option<Arc<Unit>> {
        self.lock().get(path).cloned()
    }

    /// Cache `unit` under its path, returning the unit it replaced
    pub fn store(&self, unit: Unit) -> Option<Arc<Unit>> {
        let path = unit.path.clone();
        let replaced = self.lock().insert(path, Arc::new(unit));
        if let Some(old) = &replaced {
            tracing::trace!(
                "Replaced unit {} (v{})",
                old.path.display(),
                old.source_version
            );
        }
        replaced
    }

    /// Cached unit for `path`, building and storing one if absent.
    ///
    /// `build` runs without the lock held.
    pub fn get_or_build<F>(&self, path: &Path, build: F) -> Arc<Unit>
    where
        F: FnOnce() -> Unit,
    {
        if let Some(unit) = self.get(path) {
            return unit;
        }

        let unit = Arc::new(build());
        let mut units = self.lock();
        Arc::clone(units.entry(path.to_path_buf()).or_insert(unit))
    }

    pub fn remove(&self, path: &Path) -> Option<Arc<Unit>> {
        self.lock().remove(path)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.lock().keys().cloned().collect();
        paths.sort();
        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::language::Language;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountedHandle(Arc<AtomicUsize>);

    impl UnitHandle for CountedHandle {
        fn dump(&self) -> String {
            "(translation_unit)".to_string()
        }
    }

    impl Drop for CountedHandle {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn unit_with_handle(path: &str, version: u64, released: &Arc<AtomicUsize>) -> Unit {
        Unit::new(
            path,
            version,
            Vec::new(),
            Some(Box::new(CountedHandle(Arc::clone(released)))),
        )
    }

    #[test]
    fn test_store_replaces_and_releases() {
        let store = UnitStore::new();
        let released = Arc::new(AtomicUsize::new(0));

        assert!(store.store(unit_with_handle("a.cc", 1, &released)).is_none());
        let old = store.store(unit_with_handle("a.cc", 2, &released));
        assert_eq!(old.as_ref().map(|u| u.source_version()), Some(1));
        assert_eq!(released.load(Ordering::SeqCst), 0);

        drop(old);
        assert_eq!(released.load(Ordering::SeqCst), 1);
        assert_eq!(store.get(Path::new("a.cc")).unwrap().source_version(), 2);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_reader_keeps_replaced_unit_alive() {
        let store = UnitStore::new();
        let released = Arc::new(AtomicUsize::new(0));

        store.store(unit_with_handle("a.cc", 1, &released));
        let reader = store.get(Path::new("a.cc")).unwrap();
        store.store(unit_with_handle("a.cc", 2, &released));
        assert_eq!(released.load(Ordering::SeqCst), 0);
        assert_eq!(reader.dump(), "(translation_unit)");

        drop(reader);
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let store = UnitStore::new();
        assert!(store.remove(Path::new("missing.cc")).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_get_or_build_builds_once() {
        let store = UnitStore::new();
        let path = Path::new("a.cc");
        let builds = AtomicUsize::new(0);

        for _ in 0..3 {
            let unit = store.get_or_build(path, || {
                builds.fetch_add(1, Ordering::SeqCst);
                Unit::new(path, 1, Vec::new(), None)
            });
            assert_eq!(unit.source_version(), 1);
        }
        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_unit_reports_error() {
        let unit = Unit::failed("a.txt", 3, &BuildError::UnsupportedLanguage(Language::Unknown));
        assert_eq!(unit.source_version(), 3);
        assert_eq!(unit.diagnostics().len(), 1);
        assert_eq!(unit.diagnostics()[0].severity, DiagnosticSeverity::Warning);
        assert!(!unit.has_handle());
        assert_eq!(unit.dump(), "<no build output>");
    }
}
