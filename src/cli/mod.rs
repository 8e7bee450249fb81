//! CLI module for Distill
//!
//! This module handles command-line argument parsing and command execution.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::utils::logging::{LogFormat, LogLevel};

pub mod args;
pub mod commands;

pub use args::{ScenesArgs, SummarizeArgs};

/// Distill video highlight condenser
///
/// Splits a video into scenes, scores them by audio energy, motion and
/// speech, and keeps the best ones within a duration budget.
#[derive(Parser, Debug)]
#[command(name = "distiller")]
#[command(about = "Distill - Condense long videos into highlight reels")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Logging level
    #[arg(long, value_enum, global = true)]
    pub log_level: Option<LogLevel>,

    /// Log output format
    #[arg(long, value_enum, global = true)]
    pub log_format: Option<LogFormat>,

    /// Configuration file (default: distill.toml or config/distill.toml)
    #[arg(long, env = "DISTILL_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Replace existing output files
    #[arg(long, global = true)]
    pub overwrite: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Score every scene and select a highlight plan
    Summarize(SummarizeArgs),
    /// Detect and list scenes without scoring
    Scenes(ScenesArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "distiller",
            "scenes",
            "-i",
            "talk.mp4",
            "--log-level",
            "debug",
            "--overwrite",
        ])
        .unwrap();
        assert_eq!(cli.log_level, Some(LogLevel::Debug));
        assert!(cli.overwrite);
        assert!(matches!(cli.command, Commands::Scenes(_)));
    }
}
