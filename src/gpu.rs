//! nvidia-smi CSV telemetry parsing.
//!
//! Rows look like:
//!
//! ```text
//! timestamp, utilization.gpu [%], utilization.memory [%], memory.used [MiB], memory.total [MiB]
//! 2026/01/18 21:52:29.123, 87 %, 45 %, 3541 MiB, 12288 MiB
//! ```
//!
//! A malformed row never aborts the file; it is skipped and the rest of the
//! rows are kept in order.

use std::fs;
use std::path::Path;

use chrono::NaiveDateTime;
use tracing::warn;

use crate::metric::{GpuSample, SweepKind};

/// Timestamp layout nvidia-smi writes; fractional seconds are discarded
/// before parsing.
pub const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Parse one telemetry file, skipping the header row and any row that fails
/// to parse. I/O errors are logged and produce an empty vec.
pub fn parse_log(path: &Path) -> Vec<GpuSample> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            warn!("error reading GPU log {}: {err}", path.display());
            return Vec::new();
        }
    };
    text.lines().skip(1).filter_map(parse_row).collect()
}

/// Load every telemetry file for a sweep (`{sweep}_*.csv`), concatenated and
/// sorted ascending by timestamp, ready for window selection.
pub fn load_sweep(gpu_dir: &Path, sweep: SweepKind) -> Vec<GpuSample> {
    let pattern = gpu_dir.join(format!("{}_*.csv", sweep.label()));
    let pattern = pattern.to_string_lossy();

    let mut samples = Vec::new();
    match glob::glob(&pattern) {
        Ok(paths) => {
            for path in paths.flatten() {
                samples.extend(parse_log(&path));
            }
        }
        Err(err) => warn!("bad GPU log pattern {pattern}: {err}"),
    }
    samples.sort_by_key(|sample| sample.timestamp);
    samples
}

fn parse_row(line: &str) -> Option<GpuSample> {
    let columns: Vec<&str> = line.split(',').collect();
    if columns.len() < 4 {
        return None;
    }

    // "2026/01/18 21:52:29.123" -> keep everything before the '.'
    let raw_ts = columns[0].trim();
    let raw_ts = raw_ts.split('.').next()?;
    let timestamp = NaiveDateTime::parse_from_str(raw_ts, TIMESTAMP_FORMAT).ok()?;

    let gpu_util_percent = parse_suffixed(columns[1], "%")?;
    let mem_used_mib = parse_suffixed(columns[3], "MiB")?;

    Some(GpuSample {
        timestamp,
        gpu_util_percent,
        mem_used_mib,
    })
}

/// Parse a float column carrying a unit suffix, e.g. `" 87 %"` or `" 3541 MiB"`.
fn parse_suffixed(column: &str, suffix: &str) -> Option<f64> {
    column
        .trim()
        .trim_end_matches(suffix)
        .trim()
        .parse()
        .ok()
}
