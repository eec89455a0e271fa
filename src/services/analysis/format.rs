//! Whitespace formatter
//!
//! Expands leading tabs, trims trailing whitespace and, for whole-file
//! formatting, makes sure the file ends with a newline. Line endings are kept.

use crate::models::config::FormatConfig;
use crate::models::lsp::Replacement;
use crate::services::capabilities::{FormatRequest, FormatScope, Formatter};

pub struct WhitespaceFormatter {
    config: FormatConfig,
}

impl WhitespaceFormatter {
    pub fn new(config: FormatConfig) -> Self {
        Self { config }
    }

    fn format_line(&self, line: &str, line_start: usize, out: &mut Vec<Replacement>) {
        let body = line.strip_suffix('\n').unwrap_or(line);
        let body = body.strip_suffix('\r').unwrap_or(body);
        let content_len = body.trim_end_matches([' ', '\t']).len();

        if content_len == 0 {
            if self.config.trim_trailing_whitespace && !body.is_empty() {
                out.push(Replacement::new(line_start, body.len(), ""));
            }
            return;
        }

        if self.config.expand_tabs {
            let indent_len = body.len() - body.trim_start_matches([' ', '\t']).len();
            let indent = &body[..indent_len];
            if indent.contains('\t') {
                let width = expanded_width(indent, self.config.tab_width);
                out.push(Replacement::new(line_start, indent_len, " ".repeat(width)));
            }
        }

        if self.config.trim_trailing_whitespace && content_len < body.len() {
            out.push(Replacement::new(
                line_start + content_len,
                body.len() - content_len,
                "",
            ));
        }
    }
}

impl Formatter for WhitespaceFormatter {
    fn format(&self, request: FormatRequest<'_>) -> Vec<Replacement> {
        let contents = request.contents;
        let (first, last) = match request.scope {
            FormatScope::File => (0, u32::MAX),
            FormatScope::Range(range) => {
                let (a, b) = (range.start.line, range.end.line);
                (a.min(b), a.max(b))
            }
            FormatScope::OnType(position) => (position.line.saturating_sub(1), position.line),
        };

        let mut replacements = Vec::new();
        let mut line_start = 0;
        for (index, line) in contents.split_inclusive('\n').enumerate() {
            let index = index as u32;
            if index > last {
                break;
            }
            if index >= first {
                self.format_line(line, line_start, &mut replacements);
            }
            line_start += line.len();
        }

        if request.scope == FormatScope::File
            && self.config.insert_final_newline
            && !contents.is_empty()
            && !contents.ends_with('\n')
        {
            replacements.push(Replacement::new(contents.len(), 0, "\n"));
        }

        replacements
    }
}

/// Visual width of an indent run with tab stops every `tab_width` columns
fn expanded_width(indent: &str, tab_width: usize) -> usize {
    let tab_width = tab_width.max(1);
    indent.chars().fold(0, |column, c| match c {
        '\t' => column + tab_width - column % tab_width,
        _ => column + 1,
    })
}
