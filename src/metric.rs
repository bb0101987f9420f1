use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Which concurrency sweep a run belongs to.
///
/// Sweeps are labeled series of load-test runs at increasing concurrency levels.
/// The label is the filename prefix both log sources use (`short_c8_summary.json`,
/// `short_20260118.csv`), so it doubles as the discovery key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SweepKind {
    Short,
    Long,
}

impl SweepKind {
    /// Report section order is fixed: short first, then long.
    pub const ALL: [SweepKind; 2] = [SweepKind::Short, SweepKind::Long];

    pub fn label(self) -> &'static str {
        match self {
            SweepKind::Short => "short",
            SweepKind::Long => "long",
        }
    }

    /// Capitalized form used in report headings ("Short Sweep Results").
    pub fn title(self) -> &'static str {
        match self {
            SweepKind::Short => "Short",
            SweepKind::Long => "Long",
        }
    }
}

impl std::fmt::Display for SweepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One fully correlated load-test run: the two k6 scalars joined with the GPU
/// telemetry aggregated over the run's heuristic time window.
///
/// Immutable once built; consumed only by the report layer.
#[derive(Debug, Clone, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct RunMetric {
    pub sweep: SweepKind,
    pub concurrency: u32,
    pub requests_per_second: f64,
    pub p95_latency_seconds: f64,
    pub avg_gpu_util_percent: f64,
    pub max_mem_used_mib: f64,
}

/// A single row of nvidia-smi telemetry.
///
/// Timestamps are naive local time, matching how the collector writes them and
/// how run end times are derived from file mtimes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpuSample {
    pub timestamp: NaiveDateTime,
    pub gpu_util_percent: f64,
    pub mem_used_mib: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sweep_labels_match_filename_prefixes() {
        assert_eq!(SweepKind::Short.label(), "short");
        assert_eq!(SweepKind::Long.label(), "long");
        assert_eq!(SweepKind::Short.to_string(), "short");
    }

    #[test]
    fn sweep_order_is_short_then_long() {
        assert_eq!(SweepKind::ALL, [SweepKind::Short, SweepKind::Long]);
    }
}
