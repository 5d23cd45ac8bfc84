// Subscription file repository
// One JSON file per group under the subscriptions directory, named by the
// group id and rewritten in full on every mutation.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tracing::{info, warn};

use feed_domain::{GroupChannels, GroupId, SubscriptionRepository};

use crate::utils::write_json_atomic;

pub struct SubscriptionFileRepository {
    dir: PathBuf,
}

impl SubscriptionFileRepository {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        SubscriptionFileRepository { dir: dir.into() }
    }

    fn group_path(&self, group_id: GroupId) -> PathBuf {
        self.dir.join(format!("{}.json", group_id))
    }
}

#[async_trait]
impl SubscriptionRepository for SubscriptionFileRepository {
    async fn load_all(&self) -> anyhow::Result<HashMap<GroupId, GroupChannels>> {
        let mut all = HashMap::new();
        if !self.dir.is_dir() {
            return Ok(all);
        }

        let mut entries = fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            let Ok(group_id) = stem.parse::<u64>() else {
                continue;
            };

            let content = fs::read_to_string(&path).await?;
            match serde_json::from_str::<GroupChannels>(&content) {
                Ok(channels) => {
                    let count: usize = channels.values().map(Vec::len).sum();
                    info!("loaded {} subscriptions for group {}", count, group_id);
                    all.insert(GroupId(group_id), channels);
                }
                Err(err) => {
                    // A corrupt group file must not abort startup; the group
                    // simply starts empty.
                    warn!(
                        "could not parse {} as a subscription file: {}",
                        path.display(),
                        err
                    );
                }
            }
        }
        Ok(all)
    }

    async fn save_group(&self, group_id: GroupId, channels: &GroupChannels) -> anyhow::Result<()> {
        write_json_atomic(&self.group_path(group_id), channels).await
    }
}
