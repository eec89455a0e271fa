//! Weft - incremental per-file analysis CLI
//!
//! Opens files in an analysis session and reports diagnostics, completions,
//! formatting edits and syntax trees as JSON.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use weft::app::App;
use weft::cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    // Quiet defaults; RUST_LOG=weft=debug or --verbose for more
    let default_filter = if cli.verbose { "weft=debug" } else { "weft=warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();

    if let Err(e) = run(cli) {
        // All errors are output as JSON for consistent machine consumption
        let response = serde_json::json!({
            "success": false,
            "error": format!("{:#}", e)
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&response)
                .unwrap_or_else(|_| format!(r#"{{"success":false,"error":"{}"}}"#, e))
        );
        std::process::exit(2);
    }
}

// Runs without an async runtime: session requests block on their replies.
fn run(cli: Cli) -> anyhow::Result<()> {
    let app = App::new(cli.format.as_deref())
        .map_err(|e| anyhow::anyhow!("Failed to initialize: {}", e))?;

    execute_command(cli.command, &app)
}

fn execute_command(command: Commands, app: &App) -> anyhow::Result<()> {
    use weft::cli::commands;

    match command {
        Commands::Check(args) => commands::check::execute(args, app),
        Commands::Complete(args) => commands::complete::execute(args, app),
        Commands::Format(args) => commands::format::execute(args, app),
        Commands::Ast(args) => commands::ast::execute(args, app),
        Commands::Config(args) => commands::config::execute(args, app),
    }
}
