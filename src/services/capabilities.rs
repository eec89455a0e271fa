//! Collaborator interfaces consumed by the session
//!
//! The session decides when these run and on which content; how they build,
//! complete or format is up to the implementation.

use std::path::Path;

use crate::error::BuildError;
use crate::infra::compile_db::CompileCommand;
use crate::infra::vfs::FileSystemProvider;
use crate::models::diagnostic::Diagnostic;
use crate::models::lsp::{CompletionItem, Position, Range, Replacement};
use crate::services::units::Unit;

pub struct BuildInputs<'a> {
    pub path: &'a Path,
    pub contents: &'a str,
    pub version: u64,
    pub command: &'a CompileCommand,
    pub fs: &'a dyn FileSystemProvider,
}

/// Turns file contents into a unit with diagnostics
pub trait UnitBuilder: Send + Sync {
    fn build(&self, inputs: BuildInputs<'_>) -> Result<Unit, BuildError>;
}

pub struct CompletionRequest<'a> {
    pub path: &'a Path,
    pub contents: &'a str,
    pub position: Position,
    pub command: &'a CompileCommand,
}

pub trait CompletionProvider: Send + Sync {
    fn complete(&self, request: CompletionRequest<'_>) -> Vec<CompletionItem>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatScope {
    File,
    Range(Range),
    /// A character was just typed at this position
    OnType(Position),
}

pub struct FormatRequest<'a> {
    pub path: &'a Path,
    pub contents: &'a str,
    pub scope: FormatScope,
}

pub trait Formatter: Send + Sync {
    /// Replacements ordered by offset, never overlapping
    fn format(&self, request: FormatRequest<'_>) -> Vec<Replacement>;
}

/// Receives diagnostics from finished rebuilds, on the worker thread
pub trait DiagnosticsConsumer: Send + Sync {
    fn on_diagnostics_ready(&self, path: &Path, diagnostics: Vec<Diagnostic>);
}

impl<F> DiagnosticsConsumer for F
where
    F: Fn(&Path, Vec<Diagnostic>) + Send + Sync,
{
    fn on_diagnostics_ready(&self, path: &Path, diagnostics: Vec<Diagnostic>) {
        self(path, diagnostics)
    }
}
