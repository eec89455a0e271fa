//! AST dump command implementation

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use crate::app::App;
use crate::cli::location::absolute_file;
use crate::cli::response::AstResponse;
use crate::models::language::Language;

#[derive(Args, Debug)]
pub struct AstArgs {
    /// File to parse
    pub file: PathBuf,
}

pub fn execute(args: AstArgs, app: &App) -> Result<()> {
    let ctx = &app.output;

    let file = absolute_file(&args.file)?;
    let contents = std::fs::read_to_string(&file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let session = app.open_quiet_session()?;
    session.add_document(&file, &contents)?;

    match session.dump_ast(&file) {
        Ok(ast) => ctx.print_success_flat(AstResponse {
            file: ctx.relative_path(&file),
            language: Language::from_path(&file).to_string(),
            ast,
        }),
        Err(e) => ctx.print_error(&e.to_string()),
    }

    Ok(())
}
