//! Vote submission and receipt commands.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;

use chains::ledger::{Receipt, ReceiptSource};
use common::{validate, VoteAnchorError};
use submission::ReceiptTracker;

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    hash: String,
    status: String,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    receipt: Option<Receipt>,
    #[allow(dead_code)]
    status: Option<String>,
}

/// Submit a vote code through the gateway.
pub async fn submit(gateway_url: &str, code: &str) -> Result<()> {
    // Validate locally first; a malformed code never needs the network.
    if !validate(code) {
        anyhow::bail!(
            "Invalid vote code: expected four dash-separated groups of five digits \
             with a valid check digit"
        );
    }

    let client = reqwest::Client::new();
    let url = format!("{}/vote", gateway_url);

    let response = client
        .post(&url)
        .json(&serde_json::json!({ "votecode": code }))
        .send()
        .await?;

    if !response.status().is_success() {
        let error_text = response.text().await.unwrap_or_default();
        anyhow::bail!("Error: {}", error_text);
    }

    let data: SubmitResponse = response.json().await?;

    println!("Vote submitted");
    println!("==============");
    println!("  Transaction: {}", data.hash);
    println!("  {}", data.status);
    println!();
    println!("Track the receipt with:");
    println!("  voteanchor status --hash {} --watch", data.hash);

    Ok(())
}

/// Check the receipt status of a submitted vote, optionally polling until
/// the receipt appears.
pub async fn status(gateway_url: &str, hash: &str, watch: bool, interval_secs: u64) -> Result<()> {
    let source = Arc::new(GatewayReceiptSource::new(gateway_url));

    if !watch {
        match source.receipt(hash).await? {
            Some(receipt) => print_receipt(&receipt)?,
            None => {
                println!("Still pending: {}", hash);
                println!("The transaction has not been included in a block yet.");
            }
        }
        return Ok(());
    }

    println!(
        "Waiting for the receipt of {} (every {}s, Ctrl-C to stop)...",
        hash, interval_secs
    );
    let tracker = ReceiptTracker::spawn(
        source,
        hash.to_string(),
        Duration::from_secs(interval_secs),
    );

    tokio::select! {
        found = tracker.wait() => match found {
            Some(receipt) => print_receipt(&receipt)?,
            None => println!("Tracking stopped before a receipt appeared."),
        },
        _ = tokio::signal::ctrl_c() => {
            // Dropping the tracker cancels polling; the vote stays on the
            // ledger either way.
            println!();
            println!("Stopped watching {}.", hash);
        }
    }

    Ok(())
}

/// Check gateway health.
pub async fn health(gateway_url: &str) -> Result<()> {
    let client = reqwest::Client::new();
    let url = format!("{}/health", gateway_url);

    let response = client.get(&url).send().await?;

    if !response.status().is_success() {
        anyhow::bail!("Gateway unhealthy: HTTP {}", response.status());
    }

    println!("Gateway at {} is healthy.", gateway_url);
    Ok(())
}

fn print_receipt(receipt: &Receipt) -> Result<()> {
    println!("Vote confirmed");
    println!("==============");
    println!("  Transaction: {}", receipt.transaction_hash);
    if let Some(block) = receipt.block_number {
        println!("  Block:       {}", block);
    }
    println!();
    println!("{}", serde_json::to_string_pretty(receipt)?);
    Ok(())
}

/// Receipt lookups routed through the gateway's status endpoint, so the
/// watch loop exercises the same tracker the server side uses.
struct GatewayReceiptSource {
    gateway_url: String,
    client: reqwest::Client,
}

impl GatewayReceiptSource {
    fn new(gateway_url: &str) -> Self {
        Self {
            gateway_url: gateway_url.to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ReceiptSource for GatewayReceiptSource {
    async fn receipt(&self, tx_hash: &str) -> Result<Option<Receipt>, VoteAnchorError> {
        let url = format!("{}/vote/status/{}", self.gateway_url, tx_hash);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| VoteAnchorError::ReceiptUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(VoteAnchorError::ReceiptUnavailable(format!(
                "gateway error {}: {}",
                status, body
            )));
        }

        let parsed: StatusResponse = response
            .json()
            .await
            .map_err(|e| VoteAnchorError::ReceiptUnavailable(e.to_string()))?;
        Ok(parsed.receipt)
    }
}
