//! Editor-facing position, edit and completion types
//!
//! Positions are 0-indexed; `character` counts UTF-8 bytes within the line.

use serde::{Deserialize, Serialize};

use crate::infra::position::offset_to_position;

// ============================================================================
// Core Types
// ============================================================================

/// Position within a document (0-indexed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }

    /// Convert 1-indexed CLI input to a 0-indexed position
    pub fn from_cli(line: u32, column: u32) -> Self {
        Self {
            line: line.saturating_sub(1),
            character: column.saturating_sub(1),
        }
    }

    /// Convert to a 1-indexed display position
    pub fn to_display(&self) -> (u32, u32) {
        (self.line + 1, self.character + 1)
    }
}

/// Range within a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    pub fn point(pos: Position) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }
}

// ============================================================================
// Edit Types
// ============================================================================

/// Position-based text edit, used for diagnostic fix-its
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextEdit {
    pub range: Range,
    pub new_text: String,
}

/// Offset-based replacement produced by formatting
///
/// Replaces `length` bytes starting at `offset` with `text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replacement {
    pub offset: usize,
    pub length: usize,
    pub text: String,
}

impl Replacement {
    pub fn new(offset: usize, length: usize, text: impl Into<String>) -> Self {
        Self {
            offset,
            length,
            text: text.into(),
        }
    }

    pub fn end(&self) -> usize {
        self.offset + self.length
    }

    /// Express this replacement as a range edit against `contents`
    pub fn to_text_edit(&self, contents: &str) -> TextEdit {
        TextEdit {
            range: Range::new(
                offset_to_position(contents, self.offset),
                offset_to_position(contents, self.end()),
            ),
            new_text: self.text.clone(),
        }
    }
}

/// Apply replacements sorted by offset and non-overlapping.
///
/// Replacements that overlap an earlier one or fall outside `contents` are
/// skipped.
pub fn apply_replacements(contents: &str, replacements: &[Replacement]) -> String {
    let mut result = String::with_capacity(contents.len());
    let mut cursor = 0;

    for replacement in replacements {
        if replacement.offset < cursor
            || replacement.end() > contents.len()
            || !contents.is_char_boundary(replacement.offset)
            || !contents.is_char_boundary(replacement.end())
        {
            tracing::warn!(
                "Skipping replacement at {}..{}",
                replacement.offset,
                replacement.end()
            );
            continue;
        }
        result.push_str(&contents[cursor..replacement.offset]);
        result.push_str(&replacement.text);
        cursor = replacement.end();
    }

    result.push_str(&contents[cursor..]);
    result
}

// ============================================================================
// Completion Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionItemKind {
    Keyword,
    Variable,
    Function,
    Type,
    Field,
    Text,
}

impl std::fmt::Display for CompletionItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Keyword => write!(f, "keyword"),
            Self::Variable => write!(f, "variable"),
            Self::Function => write!(f, "function"),
            Self::Type => write!(f, "type"),
            Self::Field => write!(f, "field"),
            Self::Text => write!(f, "text"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionItem {
    pub label: String,
    pub kind: CompletionItemKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub sort_text: String,
    pub insert_text: String,
}

impl CompletionItem {
    pub fn new(label: impl Into<String>, kind: CompletionItemKind) -> Self {
        let label = label.into();
        Self {
            sort_text: label.to_lowercase(),
            insert_text: label.clone(),
            label,
            kind,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_from_cli() {
        assert_eq!(Position::from_cli(1, 1), Position::new(0, 0));
        assert_eq!(Position::from_cli(0, 0), Position::new(0, 0));
        assert_eq!(Position::new(2, 4).to_display(), (3, 5));
    }

    #[test]
    fn test_apply_replacements_in_order() {
        let text = "a  \nb\t\n";
        let edits = vec![Replacement::new(1, 2, ""), Replacement::new(5, 1, "")];
        assert_eq!(apply_replacements(text, &edits), "a\nb\n");
    }

    #[test]
    fn test_apply_replacements_skips_overlap() {
        let text = "abcdef";
        let edits = vec![Replacement::new(0, 3, "X"), Replacement::new(2, 2, "Y")];
        assert_eq!(apply_replacements(text, &edits), "Xdef");
    }

    #[test]
    fn test_replacement_to_text_edit() {
        let text = "int x;  \nint y;";
        let edit = Replacement::new(6, 2, "").to_text_edit(text);
        assert_eq!(edit.range.start, Position::new(0, 6));
        assert_eq!(edit.range.end, Position::new(0, 8));
        assert!(edit.new_text.is_empty());
    }
}
