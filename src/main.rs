use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use dirmirror::config::{Args, SyncConfig};
use dirmirror::sync::{Reconciler, SyncLog};

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    if let Err(err) = run(&args) {
        eprintln!("{}: {:#}", "error".red().bold(), err);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    let config = SyncConfig::from_args(args)?;
    let log = SyncLog::open(&config.log_path)
        .with_context(|| format!("cannot open log file {}", config.log_path.display()))?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start runtime")?;

    let mut reconciler = Reconciler::new(config, log);
    runtime.block_on(reconciler.run());

    Ok(())
}

/// Diagnostics go to stderr; `--verbose` wins over `RUST_LOG`.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
