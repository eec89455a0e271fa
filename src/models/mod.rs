//! Data models for Weft
//!
//! Contains core type definitions used throughout the application.

pub mod config;
pub mod diagnostic;
pub mod language;
pub mod lsp;

// Re-export commonly used types
pub use config::WeftConfig;
pub use diagnostic::{Diagnostic, DiagnosticSeverity};
pub use language::Language;
pub use lsp::{
    CompletionItem, CompletionItemKind, Position, Range, Replacement, TextEdit,
    apply_replacements,
};
