//! Loadlens — load-test result analysis for LLM inference services.
//!
//! Loadlens digests the artifacts a k6-driven load-test sweep leaves behind —
//! per-run JSON summaries captured from pod logs and nvidia-smi CSV telemetry
//! — correlates them per run, and renders a Markdown performance report. A
//! companion probe measures streaming latency (TTFT, ITL) against a live
//! OpenAI-compatible endpoint.
//!
//! # Architecture
//!
//! The analyzer is one forward pipeline, no parallelism:
//!
//! - [`k6`]: extracts the two scalars we care about (requests/sec and p95
//!   latency) from a summary file that may be wrapped in log noise.
//! - [`gpu`]: parses nvidia-smi CSV telemetry into typed [`GpuSample`]s.
//! - [`correlate`]: joins the two per run via a fixed mtime-based time
//!   window, producing immutable [`RunMetric`]s.
//! - [`report`]: [`SweepReport`] is the pure, presentation-ready form of the
//!   correlated runs; a [`Reporter`] consumes it and performs the I/O
//!   (Markdown file, console table).
//!
//! The probe ([`probe`]) is independent of the analyzer and async: it streams
//! one chat completion at a time and timestamps token arrivals.
//!
//! # Design goals
//!
//! - No failure in any single file aborts a run: malformed rows are skipped,
//!   unreadable files degrade to empty results, missing sweeps are logged and
//!   omitted. The worst outcome is a partial or empty report.
//! - The computation layer is deterministic and I/O-free past parsing;
//!   reporters own the side effects.

/// Run/telemetry correlation over the mtime window
pub mod correlate;
/// nvidia-smi CSV telemetry parsing
pub mod gpu;
/// k6 summary extraction
pub mod k6;
/// Core data types shared across the pipeline
pub mod metric;
/// Streaming-latency probe (TTFT/ITL)
pub mod probe;
/// Reports and Reporters
pub mod report;
/// Statistics helpers
pub mod stats;

pub use metric::{GpuSample, RunMetric, SweepKind};
pub use report::{ConsoleReporter, MarkdownReporter, Reporter, SweepReport};
