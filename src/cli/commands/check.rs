//! Check command implementation

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Result;
use clap::Args;

use crate::app::App;
use crate::cli::response::{CheckResponse, DiagnosticOutput, FileDiagnosticsOutput};
use crate::config;
use crate::infra::file_filter::{FileFilter, FileFilterConfig};
use crate::models::diagnostic::{Diagnostic, DiagnosticSeverity};

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Files or directories to check
    #[arg(default_value = ".")]
    pub paths: Vec<PathBuf>,

    /// Filter by severity (error, warning, info, hint)
    #[arg(long, short = 's', value_delimiter = ',')]
    pub severity: Option<Vec<String>>,

    /// Walk ignored and hidden files too
    #[arg(long)]
    pub no_ignore: bool,
}

type Reports = Arc<Mutex<BTreeMap<PathBuf, Vec<Diagnostic>>>>;

pub fn execute(args: CheckArgs, app: &App) -> Result<()> {
    let ctx = &app.output;

    let severity_filter: Option<Vec<DiagnosticSeverity>> = args.severity.as_ref().map(|sevs| {
        sevs.iter()
            .filter_map(|s| s.parse::<DiagnosticSeverity>().ok())
            .collect()
    });

    let roots: Vec<PathBuf> = args
        .paths
        .iter()
        .map(|p| if p.is_absolute() { p.clone() } else { app.root().join(p) })
        .collect();
    let filter = FileFilter::new(FileFilterConfig {
        respect_ignore_files: !args.no_ignore,
        include_hidden: args.no_ignore,
        max_file_size_bytes: config::max_file_size_bytes(),
    });
    let files = filter.discover(&roots);
    tracing::debug!("Checking {} files", files.len());

    // Later reports for a file replace earlier ones
    let reports: Reports = Arc::default();
    let sink = Arc::clone(&reports);
    let mut session = app.open_session(Arc::new(move |path: &Path, diagnostics: Vec<Diagnostic>| {
        sink.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.to_path_buf(), diagnostics);
    }))?;

    for file in &files {
        match std::fs::read_to_string(file) {
            Ok(contents) => session.add_document(file, &contents)?,
            Err(e) => tracing::warn!("Skipping {}: {}", file.display(), e),
        }
    }
    session.block_until_idle()?;
    session.shutdown();

    let reports = std::mem::take(&mut *reports.lock().unwrap_or_else(PoisonError::into_inner));
    let file_outputs: Vec<FileDiagnosticsOutput> = reports
        .into_iter()
        .map(|(path, diagnostics)| {
            let diagnostics: Vec<DiagnosticOutput> = diagnostics
                .iter()
                .filter(|d| {
                    severity_filter
                        .as_ref()
                        .is_none_or(|filter| filter.contains(&d.severity))
                })
                .map(DiagnosticOutput::from)
                .collect();
            FileDiagnosticsOutput {
                file: ctx.relative_path(&path),
                count: diagnostics.len(),
                diagnostics,
            }
        })
        .filter(|output| output.count > 0)
        .collect();

    let total_diagnostics = file_outputs.iter().map(|f| f.count).sum();
    let error_count = file_outputs
        .iter()
        .flat_map(|f| &f.diagnostics)
        .filter(|d| d.severity == DiagnosticSeverity::Error.to_string())
        .count();

    ctx.print_success_flat(CheckResponse {
        files_checked: files.len(),
        total_diagnostics,
        error_count,
        files: file_outputs,
    });

    Ok(())
}
