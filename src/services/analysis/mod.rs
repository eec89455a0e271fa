//! Tree-sitter backed capabilities
//!
//! Syntax-level stand-ins for a full semantic engine: enough to produce real
//! diagnostics, completions and edits for the supported languages.

pub mod builder;
pub mod completion;
pub mod format;

pub use builder::SyntaxUnitBuilder;
pub use completion::SyntaxCompletionProvider;
pub use format::WhitespaceFormatter;
