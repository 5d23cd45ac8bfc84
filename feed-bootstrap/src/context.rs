use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use feed_application::{AppState, DedupeCache, Metrics, SubscriptionStore};
use feed_infrastructure::{
    AppConfig, EsiClient, ReferenceCache, SubscriptionFileRepository, WebhookDelivery,
};

pub struct AppContext {
    pub state: AppState,
}

impl AppContext {
    pub async fn new() -> Result<Self> {
        let config = AppConfig::load().await?;
        let runtime_config = config.to_runtime_config();

        let repo = Arc::new(SubscriptionFileRepository::new(
            &runtime_config.subscriptions_dir,
        ));
        let subscriptions = Arc::new(SubscriptionStore::load(repo).await?);

        let source = Arc::new(EsiClient::new(
            &runtime_config.reference_base_url,
            Duration::from_secs(runtime_config.request_timeout_seconds),
        )?);
        let resolver = Arc::new(
            ReferenceCache::load(
                source,
                &runtime_config.systems_path,
                &runtime_config.ship_groups_path,
                &runtime_config.names_path,
            )
            .await,
        );

        let delivery = Arc::new(WebhookDelivery::new(&runtime_config)?);
        let dedupe = Arc::new(DedupeCache::new(Duration::from_secs(
            runtime_config.dedupe_window_seconds,
        )));

        let state = AppState {
            config: runtime_config,
            subscriptions,
            resolver,
            delivery,
            dedupe,
            metrics: Arc::new(Metrics::default()),
        };

        Ok(Self { state })
    }
}
