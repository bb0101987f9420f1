//! Joining k6 run summaries with GPU telemetry.
//!
//! The two log sources share no run ID, so the join is a time heuristic: a
//! run's end is taken as its summary file's mtime and its window as the fixed
//! 120 seconds before that. The true run duration is not recoverable from the
//! available metadata, so the fixed window is kept as-is rather than guessed.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::{DateTime, Local, NaiveDateTime, TimeDelta};
use regex::Regex;
use tracing::{info, warn};

use crate::gpu;
use crate::k6;
use crate::metric::{GpuSample, RunMetric, SweepKind};

/// Heuristic run window preceding a summary file's mtime.
pub const WINDOW_SECONDS: i64 = 120;

/// Analyze one sweep: discover its summary files, load its telemetry, and
/// correlate the two. A sweep with no telemetry or no summaries yields an
/// empty vec (logged, never an error).
pub fn analyze_sweep(sweep: SweepKind, k6_dir: &Path, gpu_dir: &Path) -> Vec<RunMetric> {
    info!("analyzing {sweep} sweep results...");

    let samples = gpu::load_sweep(gpu_dir, sweep);
    if samples.is_empty() {
        warn!(
            "no GPU telemetry for {sweep} sweep in {}/{}_*.csv",
            gpu_dir.display(),
            sweep.label()
        );
        return Vec::new();
    }
    info!("loaded {} GPU telemetry entries", samples.len());

    correlate_runs(sweep, k6_dir, &samples)
}

/// Correlate each summary file in `k6_dir` matching the sweep's naming
/// convention against pre-loaded, timestamp-sorted telemetry. Returned runs
/// are sorted ascending by concurrency.
pub fn correlate_runs(sweep: SweepKind, k6_dir: &Path, samples: &[GpuSample]) -> Vec<RunMetric> {
    let mut runs = Vec::new();

    for path in summary_files(k6_dir, sweep) {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        // files without a _c<digits>_ segment are not sweep runs
        let Some(concurrency) = concurrency_from_filename(name) else {
            continue;
        };

        let summary = k6::parse_summary(&path);

        let Some(end) = mtime_local(&path) else {
            continue;
        };
        let start = end - TimeDelta::seconds(WINDOW_SECONDS);

        let window: Vec<&GpuSample> = samples
            .iter()
            .filter(|sample| start <= sample.timestamp && sample.timestamp <= end)
            .collect();

        let (avg_gpu_util, max_mem_used) = if window.is_empty() {
            info!("no GPU samples within the window of {name}; reporting zeros");
            (0.0, 0.0)
        } else {
            let avg = window.iter().map(|s| s.gpu_util_percent).sum::<f64>() / window.len() as f64;
            let max = window
                .iter()
                .map(|s| s.mem_used_mib)
                .fold(f64::MIN, f64::max);
            (avg, max)
        };

        runs.push(RunMetric {
            sweep,
            concurrency,
            requests_per_second: summary.requests_per_second.unwrap_or(0.0),
            p95_latency_seconds: summary.p95_latency_seconds.unwrap_or(0.0),
            avg_gpu_util_percent: avg_gpu_util,
            max_mem_used_mib: max_mem_used,
        });
    }

    runs.sort_by_key(|run| run.concurrency);
    runs
}

/// Extract the concurrency level from a summary filename, e.g.
/// `payload_c32_summary.json` -> 32. Filenames without a `_c<digits>_`
/// segment yield `None`.
pub fn concurrency_from_filename(name: &str) -> Option<u32> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"_c(\d+)_").expect("valid literal regex"));
    re.captures(name)?.get(1)?.as_str().parse().ok()
}

/// Summary files matching `{sweep}_c*_summary.json`, in sorted path order.
fn summary_files(k6_dir: &Path, sweep: SweepKind) -> Vec<PathBuf> {
    let pattern = k6_dir.join(format!("{}_c*_summary.json", sweep.label()));
    let pattern = pattern.to_string_lossy();

    let mut files: Vec<PathBuf> = match glob::glob(&pattern) {
        Ok(paths) => paths.flatten().collect(),
        Err(err) => {
            warn!("bad summary pattern {pattern}: {err}");
            Vec::new()
        }
    };
    if files.is_empty() {
        warn!("no k6 summaries matching {pattern}");
    }
    files.sort();
    files
}

/// A file's mtime as naive local time, comparable with telemetry timestamps.
fn mtime_local(path: &Path) -> Option<NaiveDateTime> {
    match fs::metadata(path).and_then(|meta| meta.modified()) {
        Ok(modified) => Some(DateTime::<Local>::from(modified).naive_local()),
        Err(err) => {
            warn!("cannot stat {}: {err}", path.display());
            None
        }
    }
}
