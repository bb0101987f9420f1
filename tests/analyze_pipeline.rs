//! End-to-end pipeline test: discovery, parsing, correlation, and rendering
//! over a synthetic sweep laid out on disk the way the collectors write it.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Local, NaiveDateTime, TimeDelta};

use loadlens::report::{MarkdownReporter, Reporter, SweepReport};
use loadlens::{SweepKind, correlate};

fn mtime_local(path: &Path) -> NaiveDateTime {
    let modified = fs::metadata(path).and_then(|m| m.modified()).unwrap();
    DateTime::<Local>::from(modified).naive_local()
}

/// A summary file the way the Job log captures it: k6 progress noise first,
/// then the JSON object.
fn k6_summary(rate: f64, p95_ms: f64) -> String {
    let body = serde_json::json!({
        "metrics": {
            "http_reqs": {"values": {"rate": rate}},
            "http_req_duration": {"values": {"p(95)": p95_ms}},
        }
    });
    format!("running (0m30.0s), 0/8 VUs, 240 complete and 0 interrupted iterations\n{body}\n")
}

#[test]
fn two_runs_correlate_against_shared_telemetry_and_render_sorted() {
    let root = tempfile::tempdir().unwrap();
    let k6_dir = root.path().join("k6");
    let gpu_dir = root.path().join("gpu");
    fs::create_dir_all(&k6_dir).unwrap();
    fs::create_dir_all(&gpu_dir).unwrap();

    // write in reverse concurrency order to prove the output sort
    fs::write(k6_dir.join("short_c8_summary.json"), k6_summary(64.0, 250.0)).unwrap();
    fs::write(k6_dir.join("short_c1_summary.json"), k6_summary(9.5, 120.0)).unwrap();
    // a stray file without a concurrency segment must be ignored
    fs::write(k6_dir.join("payload_summary.json"), k6_summary(1.0, 1.0)).unwrap();

    // telemetry overlapping both files' mtime windows: both files were just
    // created, so samples shortly before the earliest mtime fall inside each
    // [mtime - 120s, mtime] interval
    let end = mtime_local(&k6_dir.join("short_c1_summary.json"));
    let mut csv = String::from(
        "timestamp, utilization.gpu [%], utilization.memory [%], memory.used [MiB], memory.total [MiB]\n",
    );
    for i in 0..20 {
        let ts = end - TimeDelta::seconds(100 - i * 5);
        csv.push_str(&format!(
            "{}, {} %, 10 %, {} MiB, 12288 MiB\n",
            ts.format("%Y/%m/%d %H:%M:%S"),
            50 + i,
            3000 + i * 10,
        ));
    }
    fs::write(gpu_dir.join("short_run.csv"), csv).unwrap();

    let runs = correlate::analyze_sweep(SweepKind::Short, &k6_dir, &gpu_dir);
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0].concurrency, 1);
    assert_eq!(runs[1].concurrency, 8);
    assert_eq!(runs[0].requests_per_second, 9.5);
    assert_eq!(runs[0].p95_latency_seconds, 0.12);
    assert_eq!(runs[1].requests_per_second, 64.0);
    assert_eq!(runs[1].p95_latency_seconds, 0.25);
    // every sample sits in the window, so the max memory row wins
    assert_eq!(runs[1].max_mem_used_mib, 3190.0);
    assert!(runs[0].avg_gpu_util_percent > 0.0);

    let report = SweepReport::from(runs);
    let output = root.path().join("report.md");
    (MarkdownReporter {
        output: output.clone(),
    })
    .report(&report)
    .unwrap();

    let doc = fs::read_to_string(&output).unwrap();
    assert!(doc.starts_with("# Load Test Performance Report"));
    assert!(doc.contains("## Short Sweep Results"));
    assert!(!doc.contains("## Long Sweep Results"));

    // concurrency 1 row renders before concurrency 8
    let row1 = doc.find("| 1 | 9.50 |").unwrap();
    let row8 = doc.find("| 8 | 64.00 |").unwrap();
    assert!(row1 < row8);
    assert!(doc.contains("## Production Readiness Guide"));
}

#[test]
fn sweep_without_telemetry_is_skipped() {
    let root = tempfile::tempdir().unwrap();
    let k6_dir = root.path().join("k6");
    let gpu_dir = root.path().join("gpu");
    fs::create_dir_all(&k6_dir).unwrap();
    fs::create_dir_all(&gpu_dir).unwrap();

    fs::write(k6_dir.join("long_c4_summary.json"), k6_summary(5.0, 800.0)).unwrap();

    // no long_*.csv telemetry: the sweep yields nothing rather than failing
    let runs = correlate::analyze_sweep(SweepKind::Long, &k6_dir, &gpu_dir);
    assert!(runs.is_empty());
}
