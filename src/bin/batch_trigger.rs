//! Command-line trigger for the harvester, meant for cron entries and
//! manual one-off runs: calls `GET /run` and prints the batch report.

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::time::Duration;

#[derive(Parser)]
#[command(
    name = "batch-trigger",
    about = "Trigger one harvest batch over HTTP and print the report"
)]
struct Cli {
    /// Base URL of the running harvester service.
    #[arg(long, default_value = "http://127.0.0.1:3000")]
    url: String,

    /// Seconds to wait for the batch barrier before giving up.
    #[arg(long, default_value_t = 600)]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(cli.timeout_secs))
        .build()
        .context("failed to build HTTP client")?;

    let endpoint = format!("{}/run", cli.url.trim_end_matches('/'));
    let response = client
        .get(&endpoint)
        .send()
        .await
        .with_context(|| format!("failed to reach {endpoint}"))?;

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    if !status.is_success() {
        bail!("batch failed ({status}): {body}");
    }

    println!("{body}");
    Ok(())
}
