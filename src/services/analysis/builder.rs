//! Syntax-level unit builder
//!
//! Parses a file with its tree-sitter grammar and reports missing tokens,
//! error nodes and unresolvable quoted includes.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tree_sitter::{Node, Tree};

use crate::error::BuildError;
use crate::infra::ast::{ParserPool, node_range, visit_nodes};
use crate::infra::vfs::FileSystemProvider;
use crate::models::diagnostic::Diagnostic;
use crate::models::language::Language;
use crate::models::lsp::{Range, TextEdit};
use crate::services::capabilities::{BuildInputs, UnitBuilder};
use crate::services::units::{Unit, UnitHandle};

const SOURCE: &str = "weft";
const SNIPPET_CHARS: usize = 24;

struct SyntaxTree(Tree);

impl UnitHandle for SyntaxTree {
    fn dump(&self) -> String {
        self.0.root_node().to_sexp()
    }
}

pub struct SyntaxUnitBuilder {
    parsers: Arc<ParserPool>,
}

impl SyntaxUnitBuilder {
    pub fn new(parsers: Arc<ParserPool>) -> Self {
        Self { parsers }
    }
}

impl UnitBuilder for SyntaxUnitBuilder {
    fn build(&self, inputs: BuildInputs<'_>) -> Result<Unit, BuildError> {
        let language = Language::from_path(inputs.path);
        let tree = self.parsers.parse(language, inputs.contents)?;

        let mut diagnostics = syntax_diagnostics(tree.root_node(), inputs.contents);
        if language == Language::Cpp {
            let search_dirs = include_search_dirs(inputs.path, inputs.command.include_dirs());
            diagnostics.extend(include_diagnostics(
                tree.root_node(),
                inputs.contents,
                &search_dirs,
                inputs.fs,
            ));
        }
        diagnostics.sort_by_key(|d| d.range.start);

        tracing::trace!(
            "Built {} v{} with {} diagnostics",
            inputs.path.display(),
            inputs.version,
            diagnostics.len()
        );

        Ok(Unit::new(
            inputs.path,
            inputs.version,
            diagnostics,
            Some(Box::new(SyntaxTree(tree))),
        ))
    }
}

fn syntax_diagnostics(root: Node<'_>, source: &str) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    visit_nodes(root, |node| {
        if node.is_missing() {
            let at = Range::point(node_range(node).start);
            let diagnostic = if node.is_named() {
                Diagnostic::error(at, format!("expected {}", node.kind().replace('_', " ")))
            } else {
                Diagnostic::error(at, format!("expected '{}'", node.kind())).with_fix_it(
                    TextEdit {
                        range: at,
                        new_text: node.kind().to_string(),
                    },
                )
            };
            diagnostics.push(diagnostic.with_source(SOURCE));
            return false;
        }

        if node.is_error() {
            let message = match snippet(node, source) {
                Some(text) => format!("syntax error near '{}'", text),
                None => "syntax error".to_string(),
            };
            diagnostics.push(Diagnostic::error(node_range(node), message).with_source(SOURCE));
            return false;
        }

        true
    });

    diagnostics
}

fn snippet(node: Node<'_>, source: &str) -> Option<String> {
    let text = node.utf8_text(source.as_bytes()).ok()?;
    let first_line = text.lines().map(str::trim).find(|line| !line.is_empty())?;
    let mut snippet: String = first_line.chars().take(SNIPPET_CHARS).collect();
    if first_line.chars().count() > SNIPPET_CHARS {
        snippet.push_str("...");
    }
    Some(snippet)
}

/// The including file's directory, then `-I` directories
fn include_search_dirs(path: &Path, include_dirs: Vec<PathBuf>) -> Vec<PathBuf> {
    path.parent()
        .map(Path::to_path_buf)
        .into_iter()
        .chain(include_dirs)
        .collect()
}

fn include_diagnostics(
    root: Node<'_>,
    source: &str,
    search_dirs: &[PathBuf],
    fs: &dyn FileSystemProvider,
) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    visit_nodes(root, |node| {
        if node.kind() != "preproc_include" {
            return true;
        }
        let Some(target) = node
            .child_by_field_name("path")
            .filter(|path| path.kind() == "string_literal")
        else {
            return false;
        };
        let Ok(text) = target.utf8_text(source.as_bytes()) else {
            return false;
        };

        let name = text.trim_matches('"');
        if !name.is_empty() && !search_dirs.iter().any(|dir| fs.exists(&dir.join(name))) {
            diagnostics.push(
                Diagnostic::error(node_range(target), format!("'{}' file not found", name))
                    .with_source(SOURCE),
            );
        }
        false
    });

    diagnostics
}
