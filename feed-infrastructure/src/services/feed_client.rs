// Long-poll feed client
// Pulls one killmail per request from the RedisQ-style endpoint. A null
// package is the "no event available" signal, distinct from an error.

use std::time::Duration;

use anyhow::{anyhow, Result};
use reqwest::Client;
use tracing::info;
use uuid::Uuid;

use feed_domain::{FeedEnvelope, KillEvent};

// The upstream holds the request open until an event arrives or its own
// ten-second window lapses; the client timeout only bounds a hung socket.
const POLL_TIMEOUT: Duration = Duration::from_secs(60);

pub struct FeedClient {
    client: Client,
    url: String,
}

impl FeedClient {
    /// An empty queue id gets a random one, so parallel instances never
    /// steal events from each other's queue.
    pub fn new(base_url: &str, queue_id: &str) -> Self {
        let queue_id = if queue_id.is_empty() {
            Uuid::new_v4().simple().to_string()
        } else {
            queue_id.to_string()
        };
        let url = format!("{}?queueID={}", base_url, queue_id);
        info!("listening for killmails at {}", url);
        FeedClient {
            client: Client::new(),
            url,
        }
    }

    pub async fn poll(&self) -> Result<Option<KillEvent>> {
        let response = self
            .client
            .get(&self.url)
            .timeout(POLL_TIMEOUT)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!("feed returned status {}", response.status()));
        }

        let text = response.text().await?;
        if text.contains("<!DOCTYPE html>") {
            return Err(anyhow!("feed returned HTML instead of JSON"));
        }

        let envelope: FeedEnvelope = serde_json::from_str(&text)
            .map_err(|err| anyhow!("feed JSON parse error: {}: '{}'", err, text))?;
        Ok(envelope.package)
    }
}
