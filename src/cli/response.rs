//! Response types for CLI output
//!
//! All positions are 1-based. Every type implements Serialize for consistent
//! JSON output.

use serde::Serialize;

use crate::models::diagnostic::Diagnostic;
use crate::models::lsp::{CompletionItem, Position, TextEdit};

/// A text edit in 1-based coordinates
#[derive(Debug, Clone, Serialize)]
pub struct EditOutput {
    pub line: u32,
    pub column: u32,
    pub end_line: u32,
    pub end_column: u32,
    pub new_text: String,
}

impl From<&TextEdit> for EditOutput {
    fn from(edit: &TextEdit) -> Self {
        let (line, column) = edit.range.start.to_display();
        let (end_line, end_column) = edit.range.end.to_display();
        Self {
            line,
            column,
            end_line,
            end_column,
            new_text: edit.new_text.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DiagnosticOutput {
    pub severity: String,
    pub message: String,
    pub line: u32,
    pub column: u32,
    pub end_line: u32,
    pub end_column: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fix_its: Vec<EditOutput>,
}

impl From<&Diagnostic> for DiagnosticOutput {
    fn from(d: &Diagnostic) -> Self {
        let (end_line, end_column) = d.range.end.to_display();
        Self {
            severity: d.severity.to_string(),
            message: d.message.clone(),
            line: d.display_line(),
            column: d.display_column(),
            end_line,
            end_column,
            source: d.source.clone(),
            fix_its: d.fix_its.iter().map(EditOutput::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FileDiagnosticsOutput {
    pub file: String,
    pub count: usize,
    pub diagnostics: Vec<DiagnosticOutput>,
}

/// Response for check command
#[derive(Debug, Serialize)]
pub struct CheckResponse {
    pub files_checked: usize,
    pub total_diagnostics: usize,
    pub error_count: usize,
    pub files: Vec<FileDiagnosticsOutput>,
}

#[derive(Debug, Serialize)]
pub struct CompletionOutput {
    pub label: String,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insert_text: Option<String>,
}

impl From<CompletionItem> for CompletionOutput {
    fn from(item: CompletionItem) -> Self {
        // Only reported when it differs from the label
        let insert_text = (item.insert_text != item.label).then_some(item.insert_text);
        Self {
            label: item.label,
            kind: item.kind.to_string(),
            detail: item.detail,
            insert_text,
        }
    }
}

/// Response for complete command
#[derive(Debug, Serialize)]
pub struct CompletionResponse {
    pub file: String,
    pub line: u32,
    pub column: u32,
    pub count: usize,
    pub items: Vec<CompletionOutput>,
}

/// Response for format command
#[derive(Debug, Serialize)]
pub struct FormatResponse {
    pub file: String,
    pub scope: String,
    pub count: usize,
    pub edits: Vec<EditOutput>,
    pub written: bool,
}

/// Response for ast command
#[derive(Debug, Serialize)]
pub struct AstResponse {
    pub file: String,
    pub language: String,
    pub ast: String,
}

pub fn display_position(position: Position) -> String {
    let (line, column) = position.to_display();
    format!("{line}:{column}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::diagnostic::DiagnosticSeverity;
    use crate::models::lsp::{CompletionItemKind, Range};

    #[test]
    fn test_diagnostic_output_is_one_based() {
        let diagnostic = Diagnostic::new(
            Range::new(Position::new(0, 4), Position::new(0, 5)),
            DiagnosticSeverity::Error,
            "expected ';'",
        )
        .with_fix_it(TextEdit {
            range: Range::point(Position::new(0, 5)),
            new_text: ";".to_string(),
        });

        let output = DiagnosticOutput::from(&diagnostic);
        assert_eq!((output.line, output.column), (1, 5));
        assert_eq!((output.end_line, output.end_column), (1, 6));
        assert_eq!(output.severity, "error");
        assert_eq!(output.fix_its[0].new_text, ";");
        assert_eq!(output.fix_its[0].column, 6);
    }

    #[test]
    fn test_completion_output_insert_text() {
        let item = CompletionItem::new("count", CompletionItemKind::Variable);
        let output = CompletionOutput::from(item);
        assert_eq!(output.kind, "variable");
        assert_eq!(output.insert_text, None);

        let mut item = CompletionItem::new("push", CompletionItemKind::Function);
        item.insert_text = "push()".to_string();
        let output = CompletionOutput::from(item);
        assert_eq!(output.label, "push");
        assert_eq!(output.insert_text.as_deref(), Some("push()"));
    }

    #[test]
    fn test_display_position() {
        assert_eq!(display_position(Position::new(2, 0)), "3:1");
    }
}
