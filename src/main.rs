//! Analyze load-test results: correlate k6 summaries with GPU telemetry and
//! render the Markdown performance report.

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use loadlens::report::{ConsoleReporter, MarkdownReporter, Reporter, SweepReport};
use loadlens::{SweepKind, correlate};

/// Analyze load-test results.
#[derive(Parser)]
#[command(name = "loadlens", version, about)]
struct Cli {
    /// Directory containing k6 JSON summaries
    #[arg(long, default_value = "loadtest/logs/k6")]
    k6_dir: PathBuf,

    /// Directory containing GPU CSV logs
    #[arg(long, default_value = "loadtest/logs/gpu")]
    gpu_dir: PathBuf,

    /// Output Markdown report path
    #[arg(long, default_value = "docs/load_test_report.md")]
    output: PathBuf,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    if !cli.k6_dir.exists() {
        warn!("k6 log directory {} does not exist", cli.k6_dir.display());
    }

    let mut runs = Vec::new();
    for sweep in SweepKind::ALL {
        runs.extend(correlate::analyze_sweep(sweep, &cli.k6_dir, &cli.gpu_dir));
    }

    if runs.is_empty() {
        info!("no load-test results found; nothing to report");
        return;
    }

    let report = SweepReport::from(runs);

    if let Err(err) = ConsoleReporter.report(&report) {
        error!("console output failed: {err:#}");
    }
    // a failed write still exits 0: diagnostics were already printed
    if let Err(err) = (MarkdownReporter { output: cli.output }).report(&report) {
        error!("{err:#}");
    }
}
