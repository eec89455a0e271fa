//! Complete command implementation

use anyhow::{Context, Result};
use clap::Args;

use crate::app::App;
use crate::cli::location::ParsedLocation;
use crate::cli::response::{CompletionOutput, CompletionResponse};

#[derive(Args, Debug)]
pub struct CompleteArgs {
    /// Location (file:line[:column], 1-based)
    pub location: String,

    /// Maximum number of items (default: completion.limit from config)
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,
}

pub fn execute(args: CompleteArgs, app: &App) -> Result<()> {
    let ctx = &app.output;

    let location = ParsedLocation::parse_absolute(&args.location)?;
    let contents = std::fs::read_to_string(&location.file)
        .with_context(|| format!("Failed to read {}", location.file.display()))?;
    location.validate_position_with_content(&contents)?;

    let session = app.open_quiet_session()?;
    session.add_document(&location.file, &contents)?;

    match session.code_complete(&location.file, location.position()) {
        Ok(mut items) => {
            if let Some(limit) = args.limit {
                items.truncate(limit);
            }
            ctx.print_success_flat(CompletionResponse {
                file: ctx.relative_path(&location.file),
                line: location.line,
                column: location.column,
                count: items.len(),
                items: items.into_iter().map(CompletionOutput::from).collect(),
            });
        }
        Err(e) => ctx.print_error(&e.to_string()),
    }

    Ok(())
}
