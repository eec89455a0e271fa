//! Identifier and keyword completion

use std::collections::BTreeMap;
use std::sync::Arc;

use tree_sitter::Node;

use crate::infra::ast::{ParserPool, visit_nodes};
use crate::infra::position::position_to_offset;
use crate::models::config::CompletionConfig;
use crate::models::language::Language;
use crate::models::lsp::{CompletionItem, CompletionItemKind};
use crate::services::capabilities::{CompletionProvider, CompletionRequest};

const FUNCTION_PARENTS: &[&str] = &[
    "function_declarator",
    "function_definition",
    "function_declaration",
    "function_item",
    "method_declaration",
];

pub struct SyntaxCompletionProvider {
    parsers: Arc<ParserPool>,
    config: CompletionConfig,
}

impl SyntaxCompletionProvider {
    pub fn new(parsers: Arc<ParserPool>, config: CompletionConfig) -> Self {
        Self { parsers, config }
    }

    fn collect_identifiers(
        &self,
        language: Language,
        contents: &str,
        cursor: usize,
        items: &mut BTreeMap<String, CompletionItem>,
    ) {
        let tree = match self.parsers.parse(language, contents) {
            Ok(tree) => tree,
            Err(e) => {
                tracing::debug!("Completion without identifiers: {}", e);
                return;
            }
        };

        visit_nodes(tree.root_node(), |node| {
            let Some(kind) = identifier_kind(node) else {
                return true;
            };
            // The word being typed is not a candidate for itself
            if node.start_byte() <= cursor && cursor <= node.end_byte() {
                return false;
            }
            if let Ok(text) = node.utf8_text(contents.as_bytes()) {
                let item = items
                    .entry(text.to_string())
                    .or_insert_with(|| CompletionItem::new(text, kind));
                if kind == CompletionItemKind::Function {
                    item.kind = kind;
                }
            }
            false
        });
    }
}

impl CompletionProvider for SyntaxCompletionProvider {
    fn complete(&self, request: CompletionRequest<'_>) -> Vec<CompletionItem> {
        let language = Language::from_path(request.path);
        let cursor = floor_char_boundary(
            request.contents,
            position_to_offset(request.contents, request.position),
        );
        let prefix = word_prefix(&request.contents[..cursor]);

        let mut items = BTreeMap::new();
        self.collect_identifiers(language, request.contents, cursor, &mut items);
        if self.config.include_keywords {
            for keyword in language.keywords() {
                items.entry(keyword.to_string()).or_insert_with(|| {
                    CompletionItem::new(*keyword, CompletionItemKind::Keyword)
                        .with_detail("keyword")
                });
            }
        }

        let mut results: Vec<CompletionItem> = items
            .into_values()
            .filter(|item| item.label.starts_with(prefix) && item.label != prefix)
            .collect();
        results.sort_by(|a, b| a.sort_text.cmp(&b.sort_text).then_with(|| a.label.cmp(&b.label)));
        results.truncate(self.config.limit);
        results
    }
}

fn identifier_kind(node: Node<'_>) -> Option<CompletionItemKind> {
    match node.kind() {
        "identifier" => {
            let is_function = node
                .parent()
                .is_some_and(|parent| FUNCTION_PARENTS.contains(&parent.kind()));
            Some(if is_function {
                CompletionItemKind::Function
            } else {
                CompletionItemKind::Variable
            })
        }
        "field_identifier" | "property_identifier" => Some(CompletionItemKind::Field),
        "type_identifier" => Some(CompletionItemKind::Type),
        _ => None,
    }
}

/// Trailing identifier characters of `text`
fn word_prefix(text: &str) -> &str {
    let start = text
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_alphanumeric() || *c == '_')
        .last()
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    &text[start..]
}

fn floor_char_boundary(text: &str, mut offset: usize) -> usize {
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::compile_db::{CompilationDatabase, FallbackCompilationDatabase};
    use crate::models::lsp::Position;
    use std::path::Path;

    fn complete(
        path: &str,
        contents: &str,
        position: Position,
        config: CompletionConfig,
    ) -> Vec<CompletionItem> {
        let provider = SyntaxCompletionProvider::new(Arc::new(ParserPool::new()), config);
        let path = Path::new(path);
        let command = FallbackCompilationDatabase::default().compile_command(path);
        provider.complete(CompletionRequest {
            path,
            contents,
            position,
            command: &command,
        })
    }

    fn labels(items: &[CompletionItem]) -> Vec<&str> {
        items.iter().map(|i| i.label.as_str()).collect()
    }

    #[test]
    fn test_word_prefix() {
        assert_eq!(word_prefix("int fo"), "fo");
        assert_eq!(word_prefix("x."), "");
        assert_eq!(word_prefix(""), "");
        assert_eq!(word_prefix("a_b1"), "a_b1");
    }

    #[test]
    fn test_completes_identifiers_by_prefix() {
        let contents = "int foo;\nint fob(int a);\nint main() { return fo; }\n";
        let items = complete(
            "/src/a.cc",
            contents,
            Position::new(2, 22),
            CompletionConfig {
                include_keywords: false,
                ..CompletionConfig::default()
            },
        );

        assert_eq!(labels(&items), vec!["fob", "foo"]);
        assert_eq!(items[0].kind, CompletionItemKind::Function);
        assert_eq!(items[1].kind, CompletionItemKind::Variable);
    }

    #[test]
    fn test_keywords_and_limit() {
        let contents = "int value;\nvoid f() { re }\n";
        let items = complete(
            "/src/a.cc",
            contents,
            Position::new(1, 13),
            CompletionConfig::default(),
        );
        assert!(labels(&items).contains(&"return"));

        let config = CompletionConfig {
            limit: 1,
            include_keywords: false,
        };
        let items = complete("/src/a.cc", contents, Position::new(1, 13), config);
        assert!(items.len() <= 1);
        assert!(items.iter().all(|i| i.kind != CompletionItemKind::Keyword));
    }

    #[test]
    fn test_unknown_language_returns_nothing() {
        let items = complete(
            "/notes.txt",
            "hello he",
            Position::new(0, 8),
            CompletionConfig::default(),
        );
        assert!(items.is_empty());
    }
}
