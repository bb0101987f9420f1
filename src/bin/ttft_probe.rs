//! UX probe: measure TTFT and inter-token latency against a live streaming
//! chat endpoint, over several iterations, and print a summary.

use std::time::Duration;

use clap::Parser;
use reqwest::Client;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use loadlens::probe::{self, DEFAULT_API_KEY, ProbeConfig, ProbeSummary, StreamMetrics};

/// Measure LLM streaming metrics (TTFT, ITL).
#[derive(Parser)]
#[command(name = "ttft-probe", version, about)]
struct Cli {
    /// Endpoint URL
    #[arg(long, default_value = "http://localhost:8000/v1/chat/completions")]
    url: String,

    /// Model name
    #[arg(long, default_value = "TinyLlama/TinyLlama-1.1B-Chat-v1.0")]
    model: String,

    /// Max output tokens
    #[arg(long, default_value_t = 256)]
    max_tokens: u32,

    /// Number of runs
    #[arg(long, default_value_t = 5)]
    iterations: u32,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let api_key = std::env::var("API_KEY").unwrap_or_else(|_| DEFAULT_API_KEY.to_string());

    let cfg = ProbeConfig::builder()
        .url(cli.url)
        .model(cli.model)
        .max_tokens(cli.max_tokens)
        .api_key(api_key)
        .build();

    println!("\n--- Starting UX Probe ({} iterations) ---", cli.iterations);

    let client = Client::new();
    let mut runs: Vec<StreamMetrics> = Vec::new();

    for i in 0..cli.iterations {
        println!("\nRun {}/{}", i + 1, cli.iterations);
        match probe::measure(&client, &cfg).await {
            Ok(m) => {
                println!("  TTFT: {:.4}s", m.ttft_s);
                println!("  ITL (avg): {:.4}s", m.avg_itl_s);
                println!("  TPS: {:.2}", m.tokens_per_sec);
                runs.push(m);
            }
            Err(err) => warn!("run {} failed: {err}", i + 1),
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    if runs.is_empty() {
        eprintln!("No successful runs.");
        std::process::exit(1);
    }

    let summary = ProbeSummary::from(runs.as_slice());
    println!("\n{}", "=".repeat(40));
    println!("FINAL RESULTS ({} runs)", summary.runs);
    println!("{}", "=".repeat(40));
    println!("TTFT (Time To First Token):");
    println!("  Avg: {:.2} ms", summary.avg_ttft_s * 1000.0);
    println!("  p95: {:.2} ms", summary.p95_ttft_s * 1000.0);
    println!("{}", "-".repeat(20));
    println!("TBG (Time Between Generations / ITL):");
    println!("  Avg: {:.2} ms", summary.avg_itl_s * 1000.0);
    println!("{}", "-".repeat(20));
    println!("Throughput:");
    println!("  Avg: {:.2} tokens/s", summary.avg_tokens_per_sec);
    println!("{}", "=".repeat(40));
}
