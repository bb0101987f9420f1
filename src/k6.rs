//! k6 summary extraction.
//!
//! The load generator runs inside a Kubernetes Job and its summary JSON is
//! captured from the pod log, so the file is not guaranteed to be pure JSON:
//! shell noise may precede the object. We brute-force the boundary by trying
//! every `{` offset until a suffix parses and carries a `metrics` key. Files
//! are single-run summaries, small enough that correctness beats efficiency.

use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::warn;

/// The two scalars we pull out of a k6 run summary.
///
/// `None` means the metric was absent or unreadable; downstream treats that
/// as zero rather than an error.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct K6Summary {
    /// `metrics.http_reqs` rate, in requests per second.
    pub requests_per_second: Option<f64>,
    /// `metrics.http_req_duration` p(95), converted from milliseconds to seconds.
    pub p95_latency_seconds: Option<f64>,
}

/// Parse a k6 summary file. Never fails: I/O or decode problems are logged
/// and yield an empty [`K6Summary`].
pub fn parse_summary(path: &Path) -> K6Summary {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            warn!("error reading {}: {err}", path.display());
            return K6Summary::default();
        }
    };

    let Some(summary) = first_json_with_metrics(&text) else {
        warn!("no valid JSON with a metrics key found in {}", path.display());
        return K6Summary::default();
    };

    let metrics = &summary["metrics"];
    K6Summary {
        requests_per_second: rate(&metrics["http_reqs"]),
        p95_latency_seconds: p95_millis(&metrics["http_req_duration"]).map(|ms| ms / 1000.0),
    }
}

/// Find the first suffix of `text` that parses as a JSON object containing a
/// `metrics` key.
fn first_json_with_metrics(text: &str) -> Option<Value> {
    // '{' is ASCII, so every match offset is a valid slice boundary.
    for (pos, _) in text.match_indices('{') {
        if let Ok(value) = serde_json::from_str::<Value>(&text[pos..]) {
            if value.get("metrics").is_some() {
                return Some(value);
            }
        }
    }
    None
}

/// Requests-per-second rate, supporting both historical summary shapes:
/// nested under `values.rate` (old) or directly under `rate` (new).
fn rate(metric: &Value) -> Option<f64> {
    match metric.get("values") {
        Some(values) => values.get("rate").and_then(Value::as_f64),
        None => metric.get("rate").and_then(Value::as_f64),
    }
}

/// The 95th-percentile duration in milliseconds, from `values["p(95)"]` or a
/// top-level `"p(95)"` key.
fn p95_millis(metric: &Value) -> Option<f64> {
    metric
        .get("values")
        .unwrap_or(metric)
        .get("p(95)")
        .and_then(Value::as_f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_summary(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn p95_is_converted_from_millis_to_seconds() {
        let file = write_summary(
            r#"{"metrics": {"http_req_duration": {"values": {"p(95)": 1234.5}}}}"#,
        );
        let summary = parse_summary(file.path());
        assert_eq!(summary.p95_latency_seconds, Some(1.2345));
    }

    #[test]
    fn rate_is_read_from_both_schema_shapes() {
        let nested = write_summary(r#"{"metrics": {"http_reqs": {"values": {"rate": 42.5}}}}"#);
        assert_eq!(parse_summary(nested.path()).requests_per_second, Some(42.5));

        let flat = write_summary(r#"{"metrics": {"http_reqs": {"rate": 17.25}}}"#);
        assert_eq!(parse_summary(flat.path()).requests_per_second, Some(17.25));
    }

    #[test]
    fn json_is_found_after_leading_log_noise() {
        let file = write_summary(concat!(
            "running (0m30.0s), 0/8 VUs, 240 complete {not json}\n",
            "time=\"2026-01-18\" level=info msg=done\n",
            r#"{"metrics": {"http_reqs": {"rate": 8.0}, "http_req_duration": {"values": {"p(95)": 500.0}}}}"#,
            "\n",
        ));
        let summary = parse_summary(file.path());
        assert_eq!(summary.requests_per_second, Some(8.0));
        assert_eq!(summary.p95_latency_seconds, Some(0.5));
    }

    #[test]
    fn object_without_metrics_key_yields_empty_summary() {
        let file = write_summary(r#"{"other": 1}"#);
        assert_eq!(parse_summary(file.path()), K6Summary::default());
    }

    #[test]
    fn unreadable_file_yields_empty_summary() {
        let summary = parse_summary(Path::new("/nonexistent/short_c1_summary.json"));
        assert_eq!(summary, K6Summary::default());
    }

    #[test]
    fn missing_metric_keys_yield_none_not_failure() {
        let file = write_summary(r#"{"metrics": {"http_reqs": {"rate": 3.0}}}"#);
        let summary = parse_summary(file.path());
        assert_eq!(summary.requests_per_second, Some(3.0));
        assert_eq!(summary.p95_latency_seconds, None);
    }
}
