// Dispatch loop
// Routes one inbound killmail to every matching subscription.

use tracing::{debug, error, info, warn};

use feed_domain::{evaluate, DeliveryError, KillEvent};

use crate::AppState;

/// Evaluates every subscription of every channel of every group against one
/// event and hands each match to the delivery layer.
///
/// Failures are isolated per subscription: a delivery error never prevents
/// the remaining subscriptions from being evaluated for the same event.
pub async fn dispatch_kill(state: &AppState, event: &KillEvent) {
    let kill_id = event.killmail.killmail_id;
    let snapshot = state.subscriptions.snapshot().await;
    state.metrics.record_event();

    for (group_id, channels) in snapshot {
        for (channel_id, subscriptions) in channels {
            for subscription in subscriptions {
                // Cheapest possible check first: no reference data is
                // resolved for subscriptions that cannot possibly match.
                if subscription
                    .min_value
                    .is_some_and(|min| event.appraisal.total_value < min as f64)
                {
                    continue;
                }

                let outcome = evaluate(
                    &subscription.root_filter,
                    event,
                    state.resolver.as_ref(),
                )
                .await;
                if !outcome.matched {
                    continue;
                }
                state.metrics.record_match();

                if !state.dedupe.check_and_insert(channel_id, kill_id) {
                    debug!(
                        "[Kill: {}] duplicate for channel {}, suppressed",
                        kill_id, channel_id
                    );
                    state.metrics.record_duplicate();
                    continue;
                }

                info!(
                    "[Kill: {}] matched subscription '{}' for channel {}, filter: {}",
                    kill_id,
                    subscription.id,
                    channel_id,
                    subscription.filter_name()
                );

                match state
                    .delivery
                    .deliver(group_id, channel_id, &subscription, event, &outcome)
                    .await
                {
                    Ok(()) => state.metrics.record_delivery(),
                    Err(DeliveryError::ChannelUnusable(_)) => {
                        warn!(
                            "[Kill: {}] channel {} permanently unusable, removing its subscriptions",
                            kill_id, channel_id
                        );
                        state.metrics.record_delivery_error();
                        match state
                            .subscriptions
                            .remove_channel(group_id, channel_id)
                            .await
                        {
                            Ok(removed) => {
                                state.metrics.record_channel_removed();
                                info!(
                                    "removed {} subscriptions for channel {}",
                                    removed, channel_id
                                );
                            }
                            Err(err) => error!(
                                "failed to remove subscriptions for channel {}: {}",
                                channel_id, err
                            ),
                        }
                    }
                    Err(DeliveryError::Other(err)) => {
                        error!(
                            "[Kill: {}] delivery failed for subscription '{}': {}",
                            kill_id, subscription.id, err
                        );
                        state.metrics.record_delivery_error();
                    }
                }
            }
        }
    }
}
