// Subscription commands
// Validation and persistence for the subscription-management surface.

use tracing::info;
use uuid::Uuid;

use feed_domain::{ChannelId, FilterCondition, FilterNode, GroupId, Subscription};

use crate::{AppError, AppState};

/// Creates or replaces a subscription in its channel. An empty id gets a
/// generated one; the stored subscription is returned.
pub async fn add_or_replace(
    state: &AppState,
    group_id: GroupId,
    channel_id: ChannelId,
    mut subscription: Subscription,
) -> Result<Subscription, AppError> {
    subscription.id = subscription.id.trim().to_string();
    if subscription.id.is_empty() {
        subscription.id = Uuid::new_v4().to_string();
    }
    if subscription.description.trim().is_empty() {
        return Err(AppError::BadRequest("description is required".to_string()));
    }
    validate_filter(&subscription.root_filter)?;

    info!(
        "subscribing '{}' for group {} channel {}: {}",
        subscription.id,
        group_id,
        channel_id,
        subscription.filter_name()
    );
    state
        .subscriptions
        .add_or_replace(group_id, channel_id, subscription.clone())
        .await
        .map_err(AppError::Internal)?;
    Ok(subscription)
}

pub async fn remove(
    state: &AppState,
    group_id: GroupId,
    channel_id: ChannelId,
    subscription_id: &str,
) -> Result<(), AppError> {
    let removed = state
        .subscriptions
        .remove(group_id, channel_id, subscription_id)
        .await
        .map_err(AppError::Internal)?;
    if !removed {
        return Err(AppError::NotFound);
    }
    info!(
        "unsubscribed '{}' from group {} channel {}",
        subscription_id, group_id, channel_id
    );
    Ok(())
}

pub async fn list(
    state: &AppState,
    group_id: GroupId,
    channel_id: ChannelId,
) -> Vec<Subscription> {
    state.subscriptions.list(group_id, channel_id).await
}

/// Rejects trees that could never match or carry out-of-range bounds.
fn validate_filter(node: &FilterNode) -> Result<(), AppError> {
    match node {
        FilterNode::Condition(condition) => validate_condition(condition),
        FilterNode::And(nodes) | FilterNode::Or(nodes) => {
            for child in nodes {
                validate_filter(child)?;
            }
            Ok(())
        }
        FilterNode::Not(child) => validate_filter(child),
    }
}

fn validate_condition(condition: &FilterCondition) -> Result<(), AppError> {
    fn ordered<T: PartialOrd + Copy>(
        min: Option<T>,
        max: Option<T>,
        what: &str,
    ) -> Result<(), AppError> {
        if let (Some(min), Some(max)) = (min, max) {
            if min > max {
                return Err(AppError::BadRequest(format!(
                    "{}: min must not exceed max",
                    what
                )));
            }
        }
        Ok(())
    }

    fn non_empty<T>(ids: &[T], what: &str) -> Result<(), AppError> {
        if ids.is_empty() {
            return Err(AppError::BadRequest(format!(
                "{}: at least one ID is required",
                what
            )));
        }
        Ok(())
    }

    match condition {
        FilterCondition::TotalValue { min, max } => ordered(*min, *max, "TotalValue"),
        FilterCondition::DroppedValue { min, max } => ordered(*min, *max, "DroppedValue"),
        FilterCondition::Security { min, max } => ordered(*min, *max, "Security"),
        FilterCondition::Pilots { min, max } => ordered(*min, *max, "Pilots"),
        FilterCondition::TimeRange { start, end } => {
            if *start > 23 || *end > 23 {
                return Err(AppError::BadRequest(
                    "TimeRange: hours must be 0-23".to_string(),
                ));
            }
            Ok(())
        }
        FilterCondition::Region(ids) => non_empty(ids, "Region"),
        FilterCondition::System(ids) => non_empty(ids, "System"),
        FilterCondition::Alliance(ids) => non_empty(ids, "Alliance"),
        FilterCondition::Corporation(ids) => non_empty(ids, "Corporation"),
        FilterCondition::Character(ids) => non_empty(ids, "Character"),
        FilterCondition::ShipType(ids) => non_empty(ids, "ShipType"),
        FilterCondition::ShipGroup(ids) => non_empty(ids, "ShipGroup"),
        FilterCondition::LyRangeFrom(ranges) => {
            if ranges.is_empty() {
                return Err(AppError::BadRequest(
                    "LyRangeFrom: at least one system is required".to_string(),
                ));
            }
            if ranges.iter().any(|range| range.range_ly <= 0.0) {
                return Err(AppError::BadRequest(
                    "LyRangeFrom: range must be positive".to_string(),
                ));
            }
            Ok(())
        }
        FilterCondition::NameFragment(fragment) => {
            if fragment.is_empty() {
                return Err(AppError::BadRequest(
                    "NameFragment: fragment must not be empty".to_string(),
                ));
            }
            Ok(())
        }
        FilterCondition::IsNpc(_) | FilterCondition::IsSolo(_) => Ok(()),
    }
}
