use async_trait::async_trait;
use thiserror::Error;

use crate::entities::{KillEvent, Subscription};
use crate::services::MatchOutcome;
use crate::value_objects::{ChannelId, GroupId};

#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The destination channel can never be delivered to again; the caller
    /// removes its subscriptions.
    #[error("channel {0} is permanently unusable")]
    ChannelUnusable(ChannelId),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Downstream presentation layer. Receives every routed match.
#[async_trait]
pub trait MatchDelivery: Send + Sync {
    async fn deliver(
        &self,
        group_id: GroupId,
        channel_id: ChannelId,
        subscription: &Subscription,
        event: &KillEvent,
        outcome: &MatchOutcome,
    ) -> Result<(), DeliveryError>;
}
