//! CLI entry point - the composition root.
//!
//! Loads `.env`, parses arguments, initialises tracing and dispatches to a
//! handler. Handler errors become process exit codes.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use dmsender_cli::{Cli, Commands, handlers};
use dmsender_core::paths::{data_root, logs_dir};

/// Prefix of the shell's own daily rolling log files.
const SHELL_LOG_PREFIX: &str = "dmsender-shell";

fn init_tracing(verbose: bool) -> anyhow::Result<WorkerGuard> {
    let log_dir = match data_root() {
        Ok(root) => logs_dir(&root),
        Err(e) => {
            eprintln!("Failed to get data root for logs: {e}");
            // Fallback to current directory
            PathBuf::from(".")
        }
    };
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    // Configure daily rotating file appender
    let file_appender = tracing_appender::rolling::daily(&log_dir, SHELL_LOG_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let default_level = if verbose { "debug" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact(),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false) // No ANSI colors in files
                .compact(),
        )
        .try_init()
        .context("Failed to initialise tracing")?;

    Ok(guard)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Keep the guard alive so buffered file logs are flushed on exit
    let guard = init_tracing(cli.verbose)?;

    let result = match cli.command.unwrap_or_default() {
        Commands::Run(args) => handlers::run::execute(&args, cli.verbose).await,
        Commands::Probe(args) => handlers::probe::execute(&args).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        drop(guard);
        std::process::exit(e.exit_code());
    }

    Ok(())
}
