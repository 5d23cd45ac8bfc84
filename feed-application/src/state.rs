use std::sync::Arc;

use feed_domain::{MatchDelivery, ReferenceResolver, RuntimeConfig};

use crate::{DedupeCache, Metrics, SubscriptionStore};

#[derive(Clone)]
pub struct AppState {
    pub config: RuntimeConfig,
    pub subscriptions: Arc<SubscriptionStore>,
    pub resolver: Arc<dyn ReferenceResolver>,
    pub delivery: Arc<dyn MatchDelivery>,
    pub dedupe: Arc<DedupeCache>,
    pub metrics: Arc<Metrics>,
}
