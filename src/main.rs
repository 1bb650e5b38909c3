//! clipbatch CLI
//!
//! Batch split, audio/video separation and GIF export, delegated to external
//! worker programs that speak a JSON-lines progress protocol.
//!
//! # Usage
//!
//! ```bash
//! clipbatch split ./footage --duration 60 --fps 30
//! clipbatch separate a.mp4 b.mov --sample-rate 44100 --rate-for b.mov=48000
//! clipbatch gif clip.mp4 --width 480 --trim-start 2 --trim-end 12 --cut 5-6.5
//! clipbatch probe ./footage --json
//! ```

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;

use clipbatch::adapters::toml_config::TomlConfigAdapter;
use clipbatch::adapters::tracing_log;
use clipbatch::cli::commands::{self, CommandContext};
use clipbatch::cli::{Cli, Commands};
use clipbatch::engine::WorkerCommand;

/// Main entry point for the clipbatch CLI application
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // CLI > Env > File > Defaults
    let mut config = TomlConfigAdapter::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    if let Some(timeout) = cli.timeout {
        config.run.timeout_secs = Some(timeout);
    }

    tracing_log::init(&config.logging.level, config.logging.json);
    debug!(?config, "Configuration resolved");

    let ctx = CommandContext {
        json: cli.json,
        verbose: cli.verbose,
        dry_run: cli.dry_run,
        worker: cli
            .worker
            .as_ref()
            .map(|program| WorkerCommand::new(program).args(cli.worker_args.iter().cloned())),
        timeout: config.run.timeout_secs.map(Duration::from_secs),
        config,
    };

    let result = match cli.command {
        Commands::Split(args) => commands::split(&ctx, args).await,
        Commands::Separate(args) => commands::separate(&ctx, args).await,
        Commands::Gif(args) => commands::gif(&ctx, args).await,
        Commands::Probe(args) => commands::probe(&ctx, args).await,
    };

    let code = result?;
    if code != 0 {
        debug!(code, "Exiting with failure status");
        std::process::exit(code);
    }
    Ok(())
}
