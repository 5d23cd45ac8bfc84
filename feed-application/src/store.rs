// Subscription store
// In-memory view of every group's subscriptions with per-group write
// serialization and write-through persistence.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::info;

use feed_domain::{ChannelId, GroupChannels, GroupId, Subscription, SubscriptionRepository};

pub struct SubscriptionStore {
    groups: RwLock<HashMap<GroupId, GroupChannels>>,
    repo: Arc<dyn SubscriptionRepository>,
    // One lock per group: mutations (and their file rewrites) serialize per
    // group while dispatch keeps reading snapshots.
    group_locks: Mutex<HashMap<GroupId, Arc<Mutex<()>>>>,
}

impl SubscriptionStore {
    pub async fn load(repo: Arc<dyn SubscriptionRepository>) -> anyhow::Result<Self> {
        let groups = repo.load_all().await?;
        let total: usize = groups
            .values()
            .flat_map(|channels| channels.values())
            .map(Vec::len)
            .sum();
        info!(
            "loaded {} subscriptions across {} groups",
            total,
            groups.len()
        );
        Ok(SubscriptionStore {
            groups: RwLock::new(groups),
            repo,
            group_locks: Mutex::new(HashMap::new()),
        })
    }

    /// Cloned snapshot for dispatch iteration; the read lock is released
    /// before any evaluation starts.
    pub async fn snapshot(&self) -> HashMap<GroupId, GroupChannels> {
        self.groups.read().await.clone()
    }

    pub async fn list(&self, group_id: GroupId, channel_id: ChannelId) -> Vec<Subscription> {
        self.groups
            .read()
            .await
            .get(&group_id)
            .and_then(|channels| channels.get(&channel_id))
            .cloned()
            .unwrap_or_default()
    }

    pub async fn list_group(&self, group_id: GroupId) -> GroupChannels {
        self.groups
            .read()
            .await
            .get(&group_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Inserts the subscription, replacing any existing one with the same
    /// id in the channel. The group file is persisted before the in-memory
    /// view is updated.
    pub async fn add_or_replace(
        &self,
        group_id: GroupId,
        channel_id: ChannelId,
        subscription: Subscription,
    ) -> anyhow::Result<()> {
        let lock = self.group_lock(group_id).await;
        let _guard = lock.lock().await;

        let mut channels = self.list_group(group_id).await;
        let subscriptions = channels.entry(channel_id).or_default();
        if let Some(existing) = subscriptions
            .iter_mut()
            .find(|existing| existing.id == subscription.id)
        {
            *existing = subscription;
        } else {
            subscriptions.push(subscription);
        }

        self.persist(group_id, channels).await
    }

    /// Removes one subscription by id. Returns false when it did not exist.
    pub async fn remove(
        &self,
        group_id: GroupId,
        channel_id: ChannelId,
        subscription_id: &str,
    ) -> anyhow::Result<bool> {
        let lock = self.group_lock(group_id).await;
        let _guard = lock.lock().await;

        let mut channels = self.list_group(group_id).await;
        let Some(subscriptions) = channels.get_mut(&channel_id) else {
            return Ok(false);
        };
        let before = subscriptions.len();
        subscriptions.retain(|subscription| subscription.id != subscription_id);
        if subscriptions.len() == before {
            return Ok(false);
        }
        if subscriptions.is_empty() {
            channels.remove(&channel_id);
        }

        self.persist(group_id, channels).await?;
        Ok(true)
    }

    /// Drops every subscription bound to a channel. Used when the delivery
    /// layer signals the channel is permanently unusable.
    pub async fn remove_channel(
        &self,
        group_id: GroupId,
        channel_id: ChannelId,
    ) -> anyhow::Result<usize> {
        let lock = self.group_lock(group_id).await;
        let _guard = lock.lock().await;

        let mut channels = self.list_group(group_id).await;
        let Some(removed) = channels.remove(&channel_id) else {
            return Ok(0);
        };

        self.persist(group_id, channels).await?;
        Ok(removed.len())
    }

    async fn persist(&self, group_id: GroupId, channels: GroupChannels) -> anyhow::Result<()> {
        self.repo.save_group(group_id, &channels).await?;
        let mut groups = self.groups.write().await;
        if channels.is_empty() {
            groups.remove(&group_id);
        } else {
            groups.insert(group_id, channels);
        }
        Ok(())
    }

    async fn group_lock(&self, group_id: GroupId) -> Arc<Mutex<()>> {
        let mut locks = self.group_locks.lock().await;
        locks.entry(group_id).or_default().clone()
    }
}
