use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;

use feed_application::commands::subscription_commands;
use feed_application::AppState;
use feed_domain::{ChannelId, GroupChannels, GroupId, Subscription};

use crate::error::HttpError;
use crate::middleware::authorize;

pub async fn list_group_subscriptions(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(group): Path<u64>,
) -> Result<Json<GroupChannels>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let channels = state.subscriptions.list_group(GroupId(group)).await;
    Ok(Json(channels))
}

pub async fn list_channel_subscriptions(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((group, channel)): Path<(u64, u64)>,
) -> Result<Json<Vec<Subscription>>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let list =
        subscription_commands::list(&state, GroupId(group), ChannelId(channel)).await;
    Ok(Json(list))
}

pub async fn put_subscription(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((group, channel)): Path<(u64, u64)>,
    Json(subscription): Json<Subscription>,
) -> Result<Json<Subscription>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let stored = subscription_commands::add_or_replace(
        &state,
        GroupId(group),
        ChannelId(channel),
        subscription,
    )
    .await?;
    Ok(Json(stored))
}

pub async fn delete_subscription(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((group, channel, id)): Path<(u64, u64, String)>,
) -> Result<StatusCode, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    subscription_commands::remove(&state, GroupId(group), ChannelId(channel), &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
