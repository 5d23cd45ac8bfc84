use std::collections::HashMap;

use async_trait::async_trait;

use crate::entities::Subscription;
use crate::value_objects::{ChannelId, GroupId};

/// A group's channel → subscription-list mapping, as persisted.
pub type GroupChannels = HashMap<ChannelId, Vec<Subscription>>;

/// Flat-file persistence for subscriptions, one file per group. Every save
/// rewrites the group's file in full.
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Loads every group file in the store. Malformed files are skipped
    /// with a diagnostic rather than failing startup.
    async fn load_all(&self) -> anyhow::Result<HashMap<GroupId, GroupChannels>>;
    async fn save_group(&self, group_id: GroupId, channels: &GroupChannels) -> anyhow::Result<()>;
}
