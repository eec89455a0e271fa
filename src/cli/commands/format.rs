//! Format command implementation

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use crate::app::App;
use crate::cli::location::{absolute_file, parse_position, parse_range};
use crate::cli::response::{EditOutput, FormatResponse, display_position};
use crate::models::lsp::apply_replacements;

#[derive(Args, Debug)]
pub struct FormatArgs {
    /// File to format
    pub file: PathBuf,

    /// Only format lines in L:C-L:C (1-based)
    #[arg(long, conflicts_with = "on_type")]
    pub range: Option<String>,

    /// Format as if a character was just typed at L:C (1-based)
    #[arg(long)]
    pub on_type: Option<String>,

    /// Rewrite the file in place
    #[arg(long, short)]
    pub write: bool,
}

pub fn execute(args: FormatArgs, app: &App) -> Result<()> {
    let ctx = &app.output;

    let file = absolute_file(&args.file)?;
    let contents = std::fs::read_to_string(&file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let session = app.open_quiet_session()?;
    session.add_document(&file, &contents)?;

    let (scope, result) = match (&args.range, &args.on_type) {
        (Some(range), _) => {
            let range = parse_range(range)?;
            let scope = format!(
                "range {}-{}",
                display_position(range.start),
                display_position(range.end)
            );
            (scope, session.format_range(&file, range))
        }
        (None, Some(position)) => {
            let position = parse_position(position)?;
            let scope = format!("on-type {}", display_position(position));
            (scope, session.format_on_type(&file, position))
        }
        (None, None) => ("file".to_string(), session.format_file(&file)),
    };

    let replacements = match result {
        Ok(replacements) => replacements,
        Err(e) => {
            ctx.print_error(&e.to_string());
            return Ok(());
        }
    };

    let written = args.write && !replacements.is_empty();
    if written {
        let formatted = apply_replacements(&contents, &replacements);
        std::fs::write(&file, formatted)
            .with_context(|| format!("Failed to write {}", file.display()))?;
        tracing::debug!("Rewrote {} ({} edits)", file.display(), replacements.len());
    }

    let edits: Vec<EditOutput> = replacements
        .iter()
        .map(|r| EditOutput::from(&r.to_text_edit(&contents)))
        .collect();
    ctx.print_success_flat(FormatResponse {
        file: ctx.relative_path(&file),
        scope,
        count: edits.len(),
        edits,
        written,
    });

    Ok(())
}
