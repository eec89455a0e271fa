//! CLI module for Weft
//!
//! Provides command-line interface using clap derive macros.

pub mod commands;
pub mod location;
pub mod output;
pub mod response;

pub use location::ParsedLocation;
pub use output::{OutputContext, OutputFormat};

use clap::{Parser, Subcommand};

use commands::{
    ast::AstArgs, check::CheckArgs, complete::CompleteArgs, config::ConfigArgs,
    format::FormatArgs,
};

const LONG_ABOUT: &str = r#"
Weft - incremental per-file analysis for live editing sessions

Every command opens the given files in an analysis session: edits are
rebuilt on a background worker, while completion and formatting requests
jump ahead of queued rebuilds.

EXAMPLES:
  weft check src/                       # Syntax and include diagnostics
  weft complete src/main.cc:10:5        # Completions at a 1-based location
  weft format src/main.cc --write       # Whitespace cleanup in place
  weft format src/main.cc --range 3:1-8:1
  weft ast src/main.cc                  # Dump the parsed tree

Set RUST_LOG=weft=debug for verbose logs, WEFT_RUN_SYNCHRONOUSLY=1 to run
every task on the calling thread.
"#;

/// Weft - incremental per-file analysis for live editing sessions
#[derive(Parser, Debug)]
#[command(name = "weft")]
#[command(author, version, about, long_about = LONG_ABOUT)]
#[command(propagate_version = true)]
#[command(after_help = "Use 'weft <COMMAND> --help' for more information about a command.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (json, text); defaults to output.format from config
    #[arg(long, global = true)]
    pub format: Option<String>,

    /// Verbose output (show debug info)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Report diagnostics for files and directories
    Check(CheckArgs),

    /// Complete at a file location
    Complete(CompleteArgs),

    /// Compute whitespace edits for a file
    Format(FormatArgs),

    /// Dump the syntax tree of a file
    Ast(AstArgs),

    /// Configuration management
    Config(ConfigArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_format_with_range() {
        let cli =
            Cli::try_parse_from(["weft", "format", "a.cc", "--range", "1:1-2:1", "-w"]).unwrap();
        match cli.command {
            Commands::Format(args) => {
                assert_eq!(args.range.as_deref(), Some("1:1-2:1"));
                assert!(args.write);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_range_conflicts_with_on_type() {
        let result = Cli::try_parse_from([
            "weft", "format", "a.cc", "--range", "1:1-2:1", "--on-type", "1:1",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_check_defaults_to_current_dir() {
        let cli = Cli::try_parse_from(["weft", "--format", "text", "check"]).unwrap();
        assert_eq!(cli.format.as_deref(), Some("text"));
        match cli.command {
            Commands::Check(args) => assert_eq!(args.paths, vec![std::path::PathBuf::from(".")]),
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
