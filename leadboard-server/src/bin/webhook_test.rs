//! leadboard-webhook-test - post a sample lead to a running webhook
//!
//! Exits non-zero when the server does not answer with a success status.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde_json::{json, Value};

#[derive(Parser, Debug)]
#[command(name = "leadboard-webhook-test")]
#[command(about = "Send a sample lead to the leadboard webhook endpoint")]
#[command(version)]
struct Args {
    /// Webhook URL
    #[arg(
        short,
        long,
        default_value = "http://localhost:5000/webhook/leads",
        env = "LEADBOARD_WEBHOOK_URL"
    )]
    url: String,

    /// Agent key sent as X-API-Key
    #[arg(short, long, env = "LEADBOARD_AGENT_KEY")]
    key: Option<String>,

    /// Request timeout in seconds
    #[arg(long, default_value = "10")]
    timeout: u64,
}

fn sample_lead() -> Value {
    json!({
        "name": "Test Lead via Webhook",
        "username": "@webhook_test",
        "tags": ["Test", "Webhook"],
        "source": "Webhook Test",
        "assessment": "Pending",
        "columnId": "newLeads",
        "contactInfo": {
            "email": "test@example.com",
            "phone": "+1234567890",
            "address": {
                "street": "123 Test St",
                "city": "Test City",
                "state": "TS",
                "zip": "12345"
            }
        },
        "questionnaire": {
            "q1": "6",
            "q2": "5"
        }
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(args.timeout))
        .build()
        .context("Failed to build HTTP client")?;

    println!("Sending POST request to: {}", args.url);

    let mut request = client.post(&args.url).json(&sample_lead());
    if let Some(key) = &args.key {
        request = request.header("X-API-Key", key);
    }

    let response = request
        .send()
        .await
        .with_context(|| format!("Request to {} failed", args.url))?;

    let status = response.status();
    let text = response.text().await.context("Failed to read response body")?;
    let pretty = serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|v| serde_json::to_string_pretty(&v).ok())
        .unwrap_or(text);

    println!("Response status: {}", status);
    println!("Response body:\n{}", pretty);

    if !status.is_success() {
        bail!("Webhook test failed with status {}", status);
    }
    println!("Webhook test successful");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_lead_uses_accepted_keys() {
        let sample = sample_lead();
        assert_eq!(sample["columnId"], "newLeads");
        assert_eq!(sample["contactInfo"]["address"]["city"], "Test City");
    }
}
