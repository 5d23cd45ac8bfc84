// Idempotency cache
// Short-lived dedupe table preventing duplicate delivery of the same event
// to the same channel. Check and insert are in-memory and non-blocking.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use feed_domain::ChannelId;

#[derive(Debug)]
pub struct DedupeCache {
    window: Duration,
    entries: Mutex<HashMap<(ChannelId, i64), Instant>>,
}

impl DedupeCache {
    pub fn new(window: Duration) -> Self {
        DedupeCache {
            window,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns true when the (channel, kill) pair has not been seen inside
    /// the window, recording it. Expired entries are purged on each call so
    /// memory stays bounded by the window.
    pub fn check_and_insert(&self, channel_id: ChannelId, kill_id: i64) -> bool {
        let mut entries = self.entries.lock().expect("dedupe cache poisoned");
        let now = Instant::now();
        entries.retain(|_, seen| now.duration_since(*seen) < self.window);

        let key = (channel_id, kill_id);
        if entries.contains_key(&key) {
            return false;
        }
        entries.insert(key, now);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("dedupe cache poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
