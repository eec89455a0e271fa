//! Location parsing for CLI commands
//!
//! Lines and columns on the command line are 1-based; they become 0-based
//! `Position`s at the session boundary.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use crate::models::lsp::{Position, Range};

#[derive(Debug, Clone)]
pub struct ParsedLocation {
    pub file: PathBuf,
    pub line: u32,
    pub column: u32,
}

impl ParsedLocation {
    /// Parse location string and convert to absolute path in one step
    pub fn parse_absolute(input: &str) -> Result<Self> {
        Self::parse(input)?.to_absolute()
    }

    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            bail!("Location cannot be empty");
        }

        let (file_part, rest) = split_path_and_position(input)?;
        let (line, column) = parse_line_column(rest)?;

        Ok(Self {
            file: PathBuf::from(file_part),
            line,
            column,
        })
    }

    pub fn position(&self) -> Position {
        Position::from_cli(self.line, self.column)
    }

    pub fn to_absolute(&self) -> Result<Self> {
        Ok(Self {
            file: absolute_file(&self.file)?,
            line: self.line,
            column: self.column,
        })
    }

    /// Validate position with pre-read content
    pub fn validate_position_with_content(&self, content: &str) -> Result<()> {
        let lines: Vec<&str> = content.lines().collect();
        let line_count = lines.len().max(1);

        if self.line as usize > line_count {
            bail!(
                "Line {} exceeds file length ({} lines)",
                self.line,
                line_count
            );
        }

        if let Some(line_content) = lines.get((self.line - 1) as usize) {
            let col_max = line_content.len() + 1;
            if self.column as usize > col_max {
                bail!(
                    "Column {} exceeds line length ({} bytes) at line {}",
                    self.column,
                    line_content.len(),
                    self.line
                );
            }
        }

        Ok(())
    }
}

impl std::fmt::Display for ParsedLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file.display(), self.line, self.column)
    }
}

/// Resolve `file` against the current directory and canonicalize it
pub fn absolute_file(file: &Path) -> Result<PathBuf> {
    let joined = if file.is_absolute() {
        file.to_path_buf()
    } else {
        std::env::current_dir()
            .context("Failed to get current directory")?
            .join(file)
    };
    joined
        .canonicalize()
        .map_err(|_| anyhow::anyhow!("File not found: {}", joined.display()))
}

/// `L[:C]`, both 1-based; the column defaults to 1
pub fn parse_line_column(input: &str) -> Result<(u32, u32)> {
    let mut parts = input.splitn(2, ':');

    let line_str = parts.next().unwrap_or("");
    let line: u32 = line_str.parse().map_err(|_| {
        anyhow::anyhow!(
            "Invalid line number '{}': must be a positive integer (1-indexed)",
            line_str
        )
    })?;

    let column: u32 = match parts.next() {
        Some(col_str) => col_str.parse().map_err(|_| {
            anyhow::anyhow!(
                "Invalid column number '{}': must be a positive integer (1-indexed)",
                col_str
            )
        })?,
        None => 1,
    };

    if line == 0 {
        bail!("Line number must be >= 1 (got 0). Line numbers are 1-indexed.");
    }
    if column == 0 {
        bail!("Column number must be >= 1 (got 0). Column numbers are 1-indexed.");
    }

    Ok((line, column))
}

pub fn parse_position(input: &str) -> Result<Position> {
    let (line, column) = parse_line_column(input.trim())?;
    Ok(Position::from_cli(line, column))
}

/// `L:C-L:C`
pub fn parse_range(input: &str) -> Result<Range> {
    let Some((start, end)) = input.trim().split_once('-') else {
        bail!("Invalid range '{}'. Expected: L:C-L:C\nExample: 3:1-5:10", input);
    };
    let start = parse_position(start)?;
    let end = parse_position(end)?;
    if end < start {
        bail!("Invalid range '{}': end is before start", input);
    }
    Ok(Range::new(start, end))
}

fn split_path_and_position(input: &str) -> Result<(&str, &str)> {
    let is_windows = input.len() > 2
        && input.as_bytes().get(1) == Some(&b':')
        && input.as_bytes().first().is_some_and(|b| b.is_ascii_alphabetic());
    let search_start = if is_windows { 2 } else { 0 };

    // The first ':' followed by a digit or '-' starts the position
    let split = input[search_start..]
        .char_indices()
        .filter(|(_, ch)| *ch == ':')
        .map(|(idx, _)| search_start + idx)
        .find(|&pos| {
            input[pos + 1..]
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_digit() || c == '-')
        });

    let Some(split_pos) = split else {
        bail!("Invalid location format. Expected: file:line[:column]\nExample: src/main.cc:10:5")
    };
    if input[split_pos + 1..].starts_with('-') {
        bail!(
            "Invalid line number: negative values not allowed. Line numbers are 1-indexed positive integers.\nExample: src/main.cc:10:5"
        )
    }

    Ok((&input[..split_pos], &input[split_pos + 1..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_location() {
        let loc = ParsedLocation::parse("src/main.cc:10:5").unwrap();
        assert_eq!(loc.file, PathBuf::from("src/main.cc"));
        assert_eq!(loc.line, 10);
        assert_eq!(loc.column, 5);
        assert_eq!(loc.position(), Position::new(9, 4));
    }

    #[test]
    fn test_parse_without_column() {
        let loc = ParsedLocation::parse("src/main.cc:10").unwrap();
        assert_eq!(loc.line, 10);
        assert_eq!(loc.column, 1);
    }

    #[test]
    fn test_parse_windows_path() {
        let loc = ParsedLocation::parse("C:\\Users\\test\\file.cc:10:5").unwrap();
        assert_eq!(loc.file, PathBuf::from("C:\\Users\\test\\file.cc"));
        assert_eq!(loc.line, 10);
    }

    #[test]
    fn test_parse_invalid() {
        assert!(ParsedLocation::parse("invalid").is_err());
        assert!(ParsedLocation::parse("file.cc").is_err());
        assert!(ParsedLocation::parse("file.cc:0:1").is_err());
        assert!(ParsedLocation::parse("").is_err());
        let err = ParsedLocation::parse("file.cc:-5:1").unwrap_err();
        assert!(err.to_string().contains("negative"));
    }

    #[test]
    fn test_parse_range() {
        let range = parse_range("3:1-5:10").unwrap();
        assert_eq!(range.start, Position::new(2, 0));
        assert_eq!(range.end, Position::new(4, 9));

        assert!(parse_range("3:1").is_err());
        assert!(parse_range("5:1-3:1").is_err());
        assert!(parse_range("0:1-3:1").is_err());
    }

    #[test]
    fn test_validate_position_with_content() {
        let loc = ParsedLocation {
            file: PathBuf::from("test.cc"),
            line: 2,
            column: 5,
        };
        let content = "line1\nline2\nline3";
        assert!(loc.validate_position_with_content(content).is_ok());

        let loc = ParsedLocation { line: 10, ..loc };
        assert!(loc.validate_position_with_content(content).is_err());
    }

    #[test]
    fn test_display() {
        let loc = ParsedLocation::parse("src/main.cc:10:5").unwrap();
        assert_eq!(loc.to_string(), "src/main.cc:10:5");
    }
}
