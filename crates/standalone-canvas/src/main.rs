//! standalone-canvas: turn canvas animation components into standalone pages.

mod cli;
mod config;
mod orchestrator;
mod output;

use clap::Parser;
use cli::Args;
use miette::{IntoDiagnostic, Result};
use tracing_subscriber::EnvFilter;

/// Environment variable holding a log filter, e.g. `canvas_extract=trace`.
const LOG_ENV: &str = "STANDALONE_CANVAS_LOG";

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args);

    let summary = orchestrator::run(args).into_diagnostic()?;
    if summary.failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn init_tracing(args: &Args) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(args.log_directive()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
