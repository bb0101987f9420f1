//! Streaming-latency probe for OpenAI-compatible chat endpoints.
//!
//! Sends one streaming `chat/completions` request and timestamps every
//! content chunk as it arrives, yielding TTFT (time to first token), ITL
//! (inter-token latency), TPOT, and token throughput for the run. The SSE
//! body is consumed line-wise; chunks without a `delta.content` field
//! (role-only deltas, keep-alives) do not count as tokens.

use std::time::Instant;

use futures::StreamExt;
use reqwest::Client;
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;
use typed_builder::TypedBuilder;

use crate::stats;

/// Known admin token baked into the test deployment; overridden by the
/// `API_KEY` environment variable in the binary.
pub const DEFAULT_API_KEY: &str = "sk-admin-token-12345";

/// Prompt long enough to exercise sustained generation.
pub const DEFAULT_PROMPT: &str = "Write a short essay about the future of AI and latency.";

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("no tokens received from stream")]
    NoTokens,
}

/// One probe request, fully specified.
#[derive(Debug, Clone, TypedBuilder)]
pub struct ProbeConfig {
    #[builder(setter(into))]
    pub url: String,
    #[builder(setter(into))]
    pub model: String,
    #[builder(default = DEFAULT_PROMPT.to_string(), setter(into))]
    pub prompt: String,
    #[builder(default = 256)]
    pub max_tokens: u32,
    #[builder(default, setter(into, strip_option))]
    pub api_key: Option<String>,
}

/// Per-run streaming metrics, all durations in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StreamMetrics {
    pub ttft_s: f64,
    pub total_time_s: f64,
    pub num_tokens: usize,
    pub tokens_per_sec: f64,
    pub avg_itl_s: f64,
    pub p95_itl_s: f64,
    pub tpot_s: f64,
}

/// Run one streaming request and measure its token timing.
pub async fn measure(client: &Client, cfg: &ProbeConfig) -> Result<StreamMetrics, ProbeError> {
    let payload = json!({
        "model": cfg.model,
        "messages": [{"role": "user", "content": cfg.prompt}],
        "max_tokens": cfg.max_tokens,
        "temperature": 0.0,
        "stream": true,
    });

    let mut request = client.post(&cfg.url).json(&payload);
    if let Some(key) = &cfg.api_key {
        request = request.bearer_auth(key);
    }

    let start = Instant::now();
    let response = request.send().await?.error_for_status()?;

    let mut first_token: Option<Instant> = None;
    let mut later_tokens: Vec<Instant> = Vec::new();

    let mut stream = response.bytes_stream();
    let mut pending: Vec<u8> = Vec::new();
    'stream: while let Some(chunk) = stream.next().await {
        pending.extend_from_slice(&chunk?);
        // SSE events are newline-delimited; a chunk may end mid-line, so
        // only complete lines are consumed and the tail carries over
        while let Some(newline) = pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = pending.drain(..=newline).collect();
            let line = String::from_utf8_lossy(&line);
            match classify_line(line.trim()) {
                SseEvent::Done => break 'stream,
                SseEvent::Content => {
                    let now = Instant::now();
                    if first_token.is_none() {
                        first_token = Some(now);
                    } else {
                        later_tokens.push(now);
                    }
                }
                SseEvent::Ignored => {}
            }
        }
    }
    let end = Instant::now();

    let first = first_token.ok_or(ProbeError::NoTokens)?;
    Ok(derive_metrics(start, first, &later_tokens, end))
}

/// How a single SSE line affects token accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SseEvent {
    /// A chunk whose `choices[0].delta` carries `content`: counts as a token.
    Content,
    /// The `[DONE]` terminator.
    Done,
    /// Anything else: blank lines, non-data lines, undecodable payloads,
    /// role-only deltas, keep-alives.
    Ignored,
}

pub fn classify_line(line: &str) -> SseEvent {
    let Some(data) = line.strip_prefix("data: ") else {
        return SseEvent::Ignored;
    };
    if data.trim() == "[DONE]" {
        return SseEvent::Done;
    }
    let Ok(chunk) = serde_json::from_str::<Value>(data) else {
        return SseEvent::Ignored;
    };
    let has_content = chunk
        .get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("delta"))
        .and_then(|delta| delta.get("content"))
        .is_some();
    if has_content {
        SseEvent::Content
    } else {
        SseEvent::Ignored
    }
}

/// Derive the run metrics from the recorded arrival times. Pure so the math
/// is testable without a live stream.
fn derive_metrics(start: Instant, first: Instant, later: &[Instant], end: Instant) -> StreamMetrics {
    let ttft = first.duration_since(start);
    let total = end.duration_since(start);

    let mut itls = Vec::with_capacity(later.len());
    let mut prev = first;
    for &t in later {
        itls.push(t.duration_since(prev).as_secs_f64());
        prev = t;
    }

    let num_tokens = itls.len() + 1;
    let tpot = if itls.is_empty() {
        0.0
    } else {
        end.duration_since(first).as_secs_f64() / itls.len() as f64
    };

    StreamMetrics {
        ttft_s: ttft.as_secs_f64(),
        total_time_s: total.as_secs_f64(),
        num_tokens,
        tokens_per_sec: num_tokens as f64 / total.as_secs_f64(),
        avg_itl_s: stats::mean(&itls),
        p95_itl_s: stats::percentile(&itls, 95.0),
        tpot_s: tpot,
    }
}

/// Aggregate view over every successful probe iteration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProbeSummary {
    pub runs: usize,
    pub avg_ttft_s: f64,
    pub p95_ttft_s: f64,
    pub avg_itl_s: f64,
    pub avg_tokens_per_sec: f64,
}

impl From<&[StreamMetrics]> for ProbeSummary {
    fn from(runs: &[StreamMetrics]) -> Self {
        let ttfts: Vec<f64> = runs.iter().map(|m| m.ttft_s).collect();
        let itls: Vec<f64> = runs.iter().map(|m| m.avg_itl_s).collect();
        let tps: Vec<f64> = runs.iter().map(|m| m.tokens_per_sec).collect();
        Self {
            runs: runs.len(),
            avg_ttft_s: stats::mean(&ttfts),
            p95_ttft_s: stats::percentile(&ttfts, 95.0),
            avg_itl_s: stats::mean(&itls),
            avg_tokens_per_sec: stats::mean(&tps),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn content_chunks_count_as_tokens() {
        let line = r#"data: {"choices": [{"delta": {"content": "Hi"}}]}"#;
        assert_eq!(classify_line(line), SseEvent::Content);
    }

    #[test]
    fn role_only_and_empty_chunks_are_ignored() {
        assert_eq!(
            classify_line(r#"data: {"choices": [{"delta": {"role": "assistant"}}]}"#),
            SseEvent::Ignored
        );
        assert_eq!(classify_line(r#"data: {"choices": []}"#), SseEvent::Ignored);
        assert_eq!(classify_line(""), SseEvent::Ignored);
        assert_eq!(classify_line(": keep-alive"), SseEvent::Ignored);
        assert_eq!(classify_line("data: not json"), SseEvent::Ignored);
    }

    #[test]
    fn done_terminates_the_stream() {
        assert_eq!(classify_line("data: [DONE]"), SseEvent::Done);
        // surrounding whitespace in the data field is tolerated
        assert_eq!(classify_line("data:  [DONE] "), SseEvent::Done);
    }

    #[test]
    fn metrics_are_derived_from_arrival_times() {
        let start = Instant::now();
        let first = start + Duration::from_millis(100);
        let later = vec![
            first + Duration::from_millis(20),
            first + Duration::from_millis(40),
            first + Duration::from_millis(60),
        ];
        let end = first + Duration::from_millis(60);

        let m = derive_metrics(start, first, &later, end);
        assert_eq!(m.num_tokens, 4);
        assert!((m.ttft_s - 0.100).abs() < 1e-9);
        assert!((m.total_time_s - 0.160).abs() < 1e-9);
        assert!((m.avg_itl_s - 0.020).abs() < 1e-9);
        // generation time / interval count
        assert!((m.tpot_s - 0.060 / 3.0).abs() < 1e-9);
        assert!((m.tokens_per_sec - 4.0 / 0.160).abs() < 1e-6);
    }

    #[test]
    fn single_token_run_has_zero_itl_and_tpot() {
        let start = Instant::now();
        let first = start + Duration::from_millis(50);
        let end = first + Duration::from_millis(10);

        let m = derive_metrics(start, first, &[], end);
        assert_eq!(m.num_tokens, 1);
        assert_eq!(m.avg_itl_s, 0.0);
        assert_eq!(m.p95_itl_s, 0.0);
        assert_eq!(m.tpot_s, 0.0);
    }

    #[test]
    fn summary_averages_across_runs() {
        let run = |ttft, tps| StreamMetrics {
            ttft_s: ttft,
            total_time_s: 1.0,
            num_tokens: 10,
            tokens_per_sec: tps,
            avg_itl_s: 0.02,
            p95_itl_s: 0.03,
            tpot_s: 0.02,
        };
        let summary = ProbeSummary::from(&[run(0.1, 50.0), run(0.3, 70.0)][..]);
        assert_eq!(summary.runs, 2);
        assert!((summary.avg_ttft_s - 0.2).abs() < 1e-12);
        assert!((summary.avg_tokens_per_sec - 60.0).abs() < 1e-12);
    }
}
