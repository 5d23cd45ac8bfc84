// Webhook match delivery
// POSTs each routed match as JSON to the configured webhook. A response
// that proves the destination is gone surfaces as a permanent channel
// failure so the caller can unsubscribe the channel.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, StatusCode};
use serde_json::json;
use tracing::info;

use feed_domain::{
    ChannelId, DeliveryError, GroupId, KillEvent, MatchDelivery, MatchOutcome, RuntimeConfig,
    Subscription,
};

// Per-channel floor between pings, matching the upstream feed's redelivery
// habits rather than any per-subscription policy.
const PING_COOLDOWN: Duration = Duration::from_secs(300);

pub struct WebhookDelivery {
    client: Client,
    url: Option<String>,
    template: Option<String>,
    last_pings: Mutex<HashMap<ChannelId, Instant>>,
}

impl WebhookDelivery {
    pub fn new(config: &RuntimeConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds.max(3)))
            .build()?;
        Ok(WebhookDelivery {
            client,
            url: config.delivery_webhook_url.clone(),
            template: config.delivery_webhook_template.clone(),
            last_pings: Mutex::new(HashMap::new()),
        })
    }

    /// Decides whether this delivery carries a ping. A ping is issued when
    /// the subscription asks for one, the event is younger than the
    /// policy's age cutoff, and the channel has not been pinged recently.
    fn resolve_mention(
        &self,
        channel_id: ChannelId,
        subscription: &Subscription,
        event: &KillEvent,
        now: Instant,
    ) -> Option<&'static str> {
        let policy = subscription.ping.as_ref()?;
        let age_minutes = event.age_minutes(Utc::now());
        if policy
            .max_ping_age_minutes()
            .is_some_and(|max| age_minutes > max as i64)
        {
            return None;
        }

        let mut last_pings = self.last_pings.lock().unwrap();
        let last = last_pings
            .entry(channel_id)
            .or_insert(now - PING_COOLDOWN - Duration::from_secs(1));
        if now.duration_since(*last) > PING_COOLDOWN {
            *last = now;
            Some(policy.mention())
        } else {
            None
        }
    }
}

fn build_payload(
    group_id: GroupId,
    channel_id: ChannelId,
    subscription: &Subscription,
    event: &KillEvent,
    outcome: &MatchOutcome,
    mention: Option<&str>,
    template: Option<&str>,
) -> serde_json::Value {
    let matched_attackers: Vec<&feed_domain::Attacker> = outcome
        .matched_attackers
        .iter()
        .filter_map(|&index| event.killmail.attackers.get(index))
        .collect();

    let mut payload = json!({
        "group_id": group_id.0,
        "channel_id": channel_id.0,
        "subscription_id": subscription.id,
        "description": subscription.description,
        "kill_id": event.killmail.killmail_id,
        "killmail_time": event.killmail.killmail_time,
        "solar_system_id": event.killmail.solar_system_id,
        "total_value": event.appraisal.total_value,
        "victim_matched": outcome.victim_matched,
        "tracks_ships": subscription.root_filter.contains_ship_condition(),
        "matched_attacker_characters": matched_attackers
            .iter()
            .filter_map(|attacker| attacker.character_id)
            .collect::<Vec<_>>(),
        "matched_attacker_ships": matched_attackers
            .iter()
            .filter_map(|attacker| attacker.ship_type_id)
            .collect::<Vec<_>>(),
        "matched_pilot_threshold": outcome.matched_pilot_threshold,
        "mention": mention,
    });

    if let Some(template) = template {
        let content = template
            .replace("{mention}", mention.unwrap_or(""))
            .replace("{kill_id}", &event.killmail.killmail_id.to_string())
            .replace("{description}", &subscription.description)
            .replace(
                "{value}",
                &format!("{:.0}", event.appraisal.total_value),
            );
        payload["content"] = json!(content.trim().to_string());
    }

    payload
}

#[async_trait]
impl MatchDelivery for WebhookDelivery {
    async fn deliver(
        &self,
        group_id: GroupId,
        channel_id: ChannelId,
        subscription: &Subscription,
        event: &KillEvent,
        outcome: &MatchOutcome,
    ) -> Result<(), DeliveryError> {
        let mention = self.resolve_mention(channel_id, subscription, event, Instant::now());
        let payload = build_payload(
            group_id,
            channel_id,
            subscription,
            event,
            outcome,
            mention,
            self.template.as_deref(),
        );

        let Some(url) = &self.url else {
            info!(
                "delivery webhook not configured; match for channel {} logged only: {}",
                channel_id, payload
            );
            return Ok(());
        };

        let response = self
            .client
            .post(url)
            .json(&payload)
            .send()
            .await
            .map_err(|err| DeliveryError::Other(err.into()))?;

        match response.status() {
            StatusCode::FORBIDDEN | StatusCode::NOT_FOUND | StatusCode::GONE => {
                Err(DeliveryError::ChannelUnusable(channel_id))
            }
            status if status.is_success() => Ok(()),
            status => Err(DeliveryError::Other(anyhow::anyhow!(
                "delivery webhook responded {}",
                status
            ))),
        }
    }
}
