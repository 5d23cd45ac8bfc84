use axum::Router;

use feed_application::AppState;

use crate::handlers::{ops_handlers, subscription_handlers};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/v1/groups/:group/subscriptions",
            axum::routing::get(subscription_handlers::list_group_subscriptions),
        )
        .route(
            "/v1/groups/:group/channels/:channel/subscriptions",
            axum::routing::get(subscription_handlers::list_channel_subscriptions)
                .put(subscription_handlers::put_subscription),
        )
        .route(
            "/v1/groups/:group/channels/:channel/subscriptions/:id",
            axum::routing::delete(subscription_handlers::delete_subscription),
        )
        .route(
            "/v1/ops/health/live",
            axum::routing::get(ops_handlers::health_live),
        )
        .route(
            "/v1/ops/metrics/prometheus",
            axum::routing::get(ops_handlers::metrics_prometheus),
        )
        .with_state(state)
}
