//! CLI entry point for the bulkfetch tool.

use std::process::ExitCode;

use anyhow::{Context, Result};
use bulkfetch_core::Pipeline;
use bulkfetch_core::config::{load_default_file_config, load_file_config};
use clap::Parser;
use tracing::{debug, info, warn};

mod cli;

use cli::Args;

/// Exit status after an interrupt (128 + SIGINT).
const EXIT_INTERRUPTED: u8 = 130;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");

    let file_config = match &args.config {
        Some(path) => Some(
            load_file_config(path)
                .with_context(|| format!("failed to load config file {}", path.display()))?,
        ),
        None => load_default_file_config().context("failed to load default config file")?,
    };
    let merged = args
        .overrides()
        .layered_over(&file_config.unwrap_or_default());
    let sources = args.source_config(&merged);
    let run_config = merged
        .into_run_config()
        .context("invalid configuration")?;
    debug!(?run_config, ?sources, "resolved configuration");

    let pipeline = Pipeline::new(run_config).context("failed to initialize downloader")?;
    info!("bulkfetch starting");

    tokio::select! {
        result = pipeline.run_from_sources(&sources) => {
            let report = result.context("download run failed")?;
            info!(
                saved = report.saved(),
                skipped = report.skipped(),
                failed = report.fetch_failed() + report.persist_failed(),
                retried = report.retried(),
                total = report.total(),
                "Download complete"
            );
            if report.has_failures() {
                warn!("some URLs could not be downloaded, see the log above");
            }
            Ok(ExitCode::SUCCESS)
        }
        Ok(()) = tokio::signal::ctrl_c() => {
            warn!("interrupted, stopping");
            Ok(ExitCode::from(EXIT_INTERRUPTED))
        }
    }
}
