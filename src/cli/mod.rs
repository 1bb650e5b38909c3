//! CLI module for clipbatch
//!
//! This module handles command-line argument parsing and command execution.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod args;
pub mod commands;

/// clipbatch - batch split, separate and GIF export through external workers
///
/// The transcoding itself is done by a worker program that reads a JSON job
/// on stdin and reports progress as JSON lines on stdout.
#[derive(Parser, Debug)]
#[command(name = "clipbatch")]
#[command(about = "Batch media processing through external workers")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Configuration file (default: ./clipbatch.toml if present)
    #[arg(long, global = true, env = "CLIPBATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Logging level (overrides config and CLIPBATCH_LOG_LEVEL)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Print progress as JSON lines
    #[arg(long, global = true)]
    pub json: bool,

    /// Print per-file detail
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Worker program (overrides the configured one)
    #[arg(long, global = true)]
    pub worker: Option<String>,

    /// Argument passed to the worker program (repeatable)
    #[arg(long = "worker-arg", global = true, allow_hyphen_values = true)]
    pub worker_args: Vec<String>,

    /// Cancel the batch after this many seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Print the job payload instead of running the worker
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Split files into segments by duration or count
    Split(args::SplitArgs),
    /// Separate audio and video tracks
    Separate(args::SeparateArgs),
    /// Convert files to animated GIFs
    Gif(args::GifArgs),
    /// Show probed media information
    Probe(args::ProbeArgs),
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
    fn test_parse_split_with_globals() {
        let cli = Cli::try_parse_from([
            "clipbatch",
            "--worker",
            "python3",
            "--worker-arg",
            "-u",
            "split",
            "a.mp4",
            "--duration",
            "60",
            "--fps-for",
            "a.mp4=24",
        ])
        .unwrap();

        assert_eq!(cli.worker.as_deref(), Some("python3"));
        assert_eq!(cli.worker_args, vec!["-u"]);
        match cli.command {
            Commands::Split(args) => {
                assert_eq!(args.duration.as_deref(), Some("60"));
                assert_eq!(args.fps_for, vec!["a.mp4=24"]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_split_requires_a_method() {
        assert!(Cli::try_parse_from(["clipbatch", "split", "a.mp4"]).is_err());
        assert!(Cli::try_parse_from(["clipbatch", "split", "a.mp4", "--duration", "10", "--segments", "3"]).is_err());
    }
}
