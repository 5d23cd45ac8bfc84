use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct Metrics {
    events_received: AtomicU64,
    matches: AtomicU64,
    deliveries: AtomicU64,
    delivery_errors: AtomicU64,
    duplicates_suppressed: AtomicU64,
    channels_removed: AtomicU64,
}

impl Metrics {
    pub fn record_event(&self) {
        self.events_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_match(&self) {
        self.matches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delivery(&self) {
        self.deliveries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delivery_error(&self) {
        self.delivery_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_duplicate(&self) {
        self.duplicates_suppressed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_channel_removed(&self) {
        self.channels_removed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn render_prometheus(&self) -> String {
        let events = self.events_received.load(Ordering::Relaxed);
        let matches = self.matches.load(Ordering::Relaxed);
        let deliveries = self.deliveries.load(Ordering::Relaxed);
        let delivery_errors = self.delivery_errors.load(Ordering::Relaxed);
        let duplicates = self.duplicates_suppressed.load(Ordering::Relaxed);
        let channels_removed = self.channels_removed.load(Ordering::Relaxed);

        format!(
            "# TYPE killfeed_events_received_total counter\n\
killfeed_events_received_total {}\n\
# TYPE killfeed_matches_total counter\n\
killfeed_matches_total {}\n\
# TYPE killfeed_deliveries_total counter\n\
killfeed_deliveries_total {}\n\
# TYPE killfeed_delivery_errors_total counter\n\
killfeed_delivery_errors_total {}\n\
# TYPE killfeed_duplicates_suppressed_total counter\n\
killfeed_duplicates_suppressed_total {}\n\
# TYPE killfeed_channels_removed_total counter\n\
killfeed_channels_removed_total {}\n",
            events, matches, deliveries, delivery_errors, duplicates, channels_removed
        )
    }
}
