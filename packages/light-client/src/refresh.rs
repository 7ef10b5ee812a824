//! Background task keeping the trust root fresh.

use std::{sync::Arc, time::Duration};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::{manager::is_expired, now, TrustedHeaders};

/// Spawns a task that checks the trust root every `interval` and updates it
/// once it is older than two thirds of `trusting_period`.
///
/// The task runs until `cancel` fires. Update failures are logged and retried
/// on the next tick.
pub fn spawn_refresh(
    headers: Arc<dyn TrustedHeaders>,
    trusting_period: Duration,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    let threshold = trusting_period * 2 / 3;

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        info!(?interval, ?threshold, "light client refresh started");

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    info!("light client refresh stopped");
                    break;
                }
                _ = ticker.tick() => {
                    refresh_once(headers.as_ref(), threshold).await;
                }
            }
        }
    })
}

async fn refresh_once(headers: &dyn TrustedHeaders, threshold: Duration) {
    let now = match now() {
        Ok(now) => now,
        Err(e) => {
            error!(error = %e, "cannot read the clock");
            return;
        }
    };

    let latest = headers.latest_trusted().await;
    if !is_expired(&latest, threshold, now) {
        debug!(height = %latest.height(), "trust root is fresh");
        return;
    }

    match headers.update(now).await {
        Ok(Some(block)) => info!(height = %block.height(), "trust root refreshed"),
        Ok(None) => debug!("no newer block to trust"),
        Err(e) => error!(error = %e, "failed to refresh the trust root"),
    }
}
