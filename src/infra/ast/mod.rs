//! Tree-sitter parsing infrastructure
//!
//! One lazily created parser per language, shared behind a mutex that
//! recovers from poisoning.

use std::collections::HashMap;
use std::sync::Mutex;

use tree_sitter::{Node, Parser, Point, Tree};

use crate::error::BuildError;
use crate::models::language::Language;
use crate::models::lsp::{Position, Range};

/// Tree-sitter columns are byte offsets within the row, matching `Position`
pub fn to_position(point: Point) -> Position {
    Position::new(point.row as u32, point.column as u32)
}

pub fn node_range(node: Node<'_>) -> Range {
    Range::new(to_position(node.start_position()), to_position(node.end_position()))
}

/// Pre-order traversal of every node under `root`, anonymous and missing
/// nodes included. Children are skipped when `visit` returns false.
pub fn visit_nodes<'t, F>(root: Node<'t>, mut visit: F)
where
    F: FnMut(Node<'t>) -> bool,
{
    let mut cursor = root.walk();
    loop {
        if visit(cursor.node()) && cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return;
            }
        }
    }
}

/// Grammar for a language, if one is bundled
pub fn grammar(language: Language) -> Option<tree_sitter::Language> {
    match language {
        Language::Cpp => Some(tree_sitter_cpp::LANGUAGE.into()),
        Language::Rust => Some(tree_sitter_rust::LANGUAGE.into()),
        Language::Python => Some(tree_sitter_python::LANGUAGE.into()),
        Language::Go => Some(tree_sitter_go::LANGUAGE.into()),
        Language::JavaScript => Some(tree_sitter_javascript::LANGUAGE.into()),
        Language::Unknown => None,
    }
}

#[derive(Default)]
pub struct ParserPool {
    parsers: Mutex<HashMap<Language, Parser>>,
}

impl ParserPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(&self, language: Language, text: &str) -> Result<Tree, BuildError> {
        let grammar = grammar(language).ok_or(BuildError::UnsupportedLanguage(language))?;

        let mut parsers = self.parsers.lock().unwrap_or_else(|poisoned| {
            // A panic mid-parse may leave a parser holding partial state
            tracing::warn!("Parser pool lock poisoned; resetting parsers");
            self.parsers.clear_poison();
            let mut parsers = poisoned.into_inner();
            parsers.values_mut().for_each(Parser::reset);
            parsers
        });

        let parser = match parsers.entry(language) {
            std::collections::hash_map::Entry::Occupied(entry) => entry.into_mut(),
            std::collections::hash_map::Entry::Vacant(entry) => {
                let mut parser = Parser::new();
                parser
                    .set_language(&grammar)
                    .map_err(|e| BuildError::Parser(e.to_string()))?;
                entry.insert(parser)
            }
        };

        parser
            .parse(text, None)
            .ok_or_else(|| BuildError::Parser(format!("Failed to parse {} source", language)))
    }
}
