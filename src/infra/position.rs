//! Conversions between (line, column) positions and byte offsets
//!
//! Both directions clamp instead of failing: editors may report positions
//! against content one edit behind ours.

use crate::models::lsp::Position;

/// Turn a position into a byte offset in `text`.
///
/// A line past the end clamps to `text.len()`; a column past the end of its
/// line clamps to the line end (before the newline).
pub fn position_to_offset(text: &str, position: Position) -> usize {
    let bytes = text.as_bytes();
    let mut line_start = 0;

    for _ in 0..position.line {
        match next_newline(bytes, line_start) {
            Some(newline) => line_start = newline + 1,
            None => return text.len(),
        }
    }

    let line_end = next_newline(bytes, line_start).unwrap_or(bytes.len());
    line_start
        .saturating_add(position.character as usize)
        .min(line_end)
}

/// Turn a byte offset into a position in `text`. Offsets past the end clamp
/// to the end of the text.
pub fn offset_to_position(text: &str, offset: usize) -> Position {
    let offset = offset.min(text.len());
    let before = &text.as_bytes()[..offset];

    let line = before.iter().filter(|&&b| b == b'\n').count();
    let line_start = before
        .iter()
        .rposition(|&b| b == b'\n')
        .map(|i| i + 1)
        .unwrap_or(0);

    Position::new(line as u32, (offset - line_start) as u32)
}

/// Byte range `[start, end)` of the given line, excluding its newline
pub fn line_bounds(text: &str, line: u32) -> Option<(usize, usize)> {
    let bytes = text.as_bytes();
    let mut line_start = 0;
    for _ in 0..line {
        line_start = next_newline(bytes, line_start)? + 1;
    }
    let line_end = next_newline(bytes, line_start).unwrap_or(bytes.len());
    Some((line_start, line_end))
}

fn next_newline(bytes: &[u8], from: usize) -> Option<usize> {
    bytes[from..].iter().position(|&b| b == b'\n').map(|i| from + i)
}
