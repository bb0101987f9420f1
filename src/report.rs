//! Reports and Reporters.
//!
//! [`SweepReport`] is the processed form of the correlated runs: a pure data
//! structure, free of I/O, built `From` the correlator's output. A
//! [`Reporter`] consumes it and performs the side effects — rendering the
//! Markdown document to disk or printing the diagnostic table to the console.
//! Keeping the boundary here lets the computation layer stay deterministic
//! while reporters handle presentation and export.

use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::metric::{RunMetric, SweepKind};

/// Fixed hardware line in the report header.
const HARDWARE_LINE: &str = "**Hardware Configuration**: NVIDIA GeForce RTX 3060 (Single GPU)";

/// Static advisory section appended to every report, independent of the
/// measured data.
const PRODUCTION_READINESS_GUIDE: &str = "\
## Production Readiness Guide
### 1. Observability
- **Metrics**: Deploy `dcgm-exporter` to scrape GPU metrics into Prometheus. Dashboard via Grafana.
- **Tracing**: Integrate OpenTelemetry sidecar for request-level tracing (e.g. Jaeger) to pinpoint latency bottlenecks.
### 2. Autoscaling
- **HPA**: Use Kubernetes HPA with custom metrics (e.g., `avg_gpu_util > 85%` or `requests_per_second`).
- **KEDA**: Event-driven autoscaling based on queue depth (e.g. Kafka/RabbitMQ) if using async inference.
### 3. Traffic Management
- **Ingress**: Nginx Ingress Controller (current) is suitable. For advanced routing (canary/blue-green), consider Gateway API + Istio.
### 4. Load Testing
- **Tools**: `hey` is good for quick baselines. For realistic scenarios, use `Locust` (Python) or `k6` (JS) to simulate user sessions and variable wait times.
";

/// The final, presentation-ready view of a set of correlated runs.
///
/// Runs are kept sorted ascending by concurrency within each sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepReport {
    runs: Vec<RunMetric>,
}

impl From<Vec<RunMetric>> for SweepReport {
    fn from(mut runs: Vec<RunMetric>) -> Self {
        runs.sort_by_key(|run| (run.sweep, run.concurrency));
        Self { runs }
    }
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn runs_for(&self, sweep: SweepKind) -> impl Iterator<Item = &RunMetric> {
        self.runs.iter().filter(move |run| run.sweep == sweep)
    }

    /// Render the full Markdown document: title, hardware line, executive
    /// summary, one table per non-empty sweep (short then long), then the
    /// static advisory section.
    pub fn to_markdown(&self) -> String {
        let mut doc = String::new();
        let _ = writeln!(doc, "# Load Test Performance Report\n");
        let _ = writeln!(doc, "{HARDWARE_LINE}\n");
        let _ = writeln!(doc, "## Executive Summary");
        let _ = writeln!(
            doc,
            "Load tests were conducted using `k6` (via Kubernetes Jobs) to verify system stability and performance boundaries."
        );
        let _ = writeln!(
            doc,
            "The results below cover Requests Per Second (RPS), Latency (p95), and Resource Utilization.\n"
        );

        for sweep in SweepKind::ALL {
            let rows: Vec<&RunMetric> = self.runs_for(sweep).collect();
            if rows.is_empty() {
                continue;
            }
            let _ = writeln!(doc, "## {} Sweep Results", sweep.title());
            let _ = writeln!(
                doc,
                "| Concurrency | RPS | p95 Latency (s) | Avg GPU Util % | Max Mem (MiB) |"
            );
            let _ = writeln!(doc, "| :--- | :--- | :--- | :--- | :--- |");
            for run in rows {
                let _ = writeln!(
                    doc,
                    "| {} | {:.2} | {:.4} | {:.1} | {:.1} |",
                    run.concurrency,
                    run.requests_per_second,
                    run.p95_latency_seconds,
                    run.avg_gpu_util_percent,
                    run.max_mem_used_mib
                );
            }
            doc.push('\n');
        }

        doc.push_str(PRODUCTION_READINESS_GUIDE);
        doc
    }
}

/// A `Reporter` consumes a [`SweepReport`] and performs side effects.
pub trait Reporter {
    fn report(&self, report: &SweepReport) -> anyhow::Result<()>;
}

/// Writes the Markdown document, unconditionally overwriting the output
/// path. Parent directories are assumed to exist.
pub struct MarkdownReporter {
    pub output: PathBuf,
}

impl Reporter for MarkdownReporter {
    fn report(&self, report: &SweepReport) -> anyhow::Result<()> {
        fs::write(&self.output, report.to_markdown())
            .with_context(|| format!("writing report to {}", self.output.display()))?;
        info!("report generated at {}", self.output.display());
        Ok(())
    }
}

/// Prints the fixed-width diagnostic table per sweep, mirroring what the
/// Markdown tables contain.
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn report(&self, report: &SweepReport) -> anyhow::Result<()> {
        for sweep in SweepKind::ALL {
            let rows: Vec<&RunMetric> = report.runs_for(sweep).collect();
            if rows.is_empty() {
                continue;
            }
            println!("\n{} sweep:", sweep.label());
            println!(
                "{:<12} {:<10} {:<12} {:<10} {:<15}",
                "Concurrency", "RPS", "p95 Latency", "Avg GPU %", "Max Mem (MiB)"
            );
            println!("{}", "-".repeat(65));
            for run in rows {
                println!(
                    "{:<12} {:<10.2} {:<12.4} {:<10.1} {:<15.1}",
                    run.concurrency,
                    run.requests_per_second,
                    run.p95_latency_seconds,
                    run.avg_gpu_util_percent,
                    run.max_mem_used_mib
                );
            }
        }
        Ok(())
    }
}
