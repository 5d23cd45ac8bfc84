use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info};

use feed_application::commands::dispatch_commands;
use feed_application::AppState;
use feed_infrastructure::FeedClient;

/// Pulls killmails from the feed until shutdown. A dispatch in flight
/// always completes; only the idle poll is abandoned when the signal
/// arrives, so no event is half-delivered.
pub async fn run_feed_loop(
    state: AppState,
    feed: FeedClient,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        if *shutdown.borrow() {
            break;
        }
        let polled = tokio::select! {
            _ = shutdown.changed() => break,
            polled = feed.poll() => polled,
        };

        match polled {
            Ok(Some(event)) => {
                info!("[Kill: {}] received", event.killmail.killmail_id);
                dispatch_commands::dispatch_kill(&state, &event).await;
            }
            Ok(None) => {
                // No new killmail this poll.
            }
            Err(err) => {
                error!("error polling killmail feed: {}", err);
                // Back off so a persistent upstream failure does not spin.
                tokio::select! {
                    _ = shutdown.changed() => break,
                    _ = tokio::time::sleep(Duration::from_secs(5)) => {}
                }
            }
        }
    }
    info!("feed loop stopped");
}
