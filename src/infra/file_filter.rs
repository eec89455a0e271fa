//! Source file discovery with .gitignore integration
//!
//! Uses the `ignore` crate (from ripgrep) to walk directories, honouring
//! `.gitignore`, git excludes and a project-level `.weftignore`.

use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

use crate::models::language::Language;

const WEFT_IGNORE_FILE: &str = ".weftignore";

#[derive(Debug, Clone)]
pub struct FileFilterConfig {
    /// Use .gitignore and .weftignore files for filtering
    pub respect_ignore_files: bool,
    /// Hidden files/directories (starting with .)
    pub include_hidden: bool,
    /// Larger files are skipped
    pub max_file_size_bytes: u64,
}

impl Default for FileFilterConfig {
    fn default() -> Self {
        Self {
            respect_ignore_files: true,
            include_hidden: false,
            max_file_size_bytes: 10 * 1024 * 1024,
        }
    }
}

pub struct FileFilter {
    config: FileFilterConfig,
}

impl FileFilter {
    pub fn new(config: FileFilterConfig) -> Self {
        Self { config }
    }

    fn walk_builder(&self, root: &Path) -> WalkBuilder {
        let mut builder = WalkBuilder::new(root);
        builder
            .hidden(!self.config.include_hidden)
            .git_ignore(self.config.respect_ignore_files)
            .git_global(self.config.respect_ignore_files)
            .git_exclude(self.config.respect_ignore_files)
            .ignore(self.config.respect_ignore_files)
            .require_git(false);
        if self.config.respect_ignore_files {
            builder.add_custom_ignore_filename(WEFT_IGNORE_FILE);
        }
        builder
    }

    /// Whether `path` is a source file weft can analyse within the size limit
    pub fn accepts(&self, path: &Path) -> bool {
        if !Language::from_path(path).is_supported() {
            return false;
        }
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > self.config.max_file_size_bytes => {
                tracing::debug!("Skipping {} ({} bytes)", path.display(), meta.len());
                false
            }
            Ok(meta) => meta.is_file(),
            Err(_) => false,
        }
    }

    /// Supported source files under `paths`, sorted and deduplicated.
    ///
    /// Files named explicitly are kept even if an ignore file matches them.
    pub fn discover(&self, paths: &[PathBuf]) -> Vec<PathBuf> {
        let mut files = Vec::new();

        for path in paths {
            if path.is_file() {
                if self.accepts(path) {
                    files.push(path.clone());
                }
                continue;
            }

            for entry in self.walk_builder(path).build() {
                match entry {
                    Ok(entry) if entry.file_type().is_some_and(|t| t.is_file()) => {
                        if self.accepts(entry.path()) {
                            files.push(entry.into_path());
                        }
                    }
                    Ok(_) => {}
                    Err(e) => tracing::warn!("Skipping unreadable entry: {}", e),
                }
            }
        }

        files.sort();
        files.dedup();
        files
    }
}
