//! Periodic self-ping for hosts that idle out quiet services.

use crate::config::KeepaliveConfig;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

const PING_TIMEOUT: Duration = Duration::from_secs(10);

/// Spawn the ping loop. It runs until the returned handle is aborted or the
/// runtime shuts down; failed pings are ignored.
pub fn spawn(config: KeepaliveConfig) -> JoinHandle<()> {
    info!(url = %config.url, interval_s = config.interval.as_secs(), "keepalive enabled");
    let client = reqwest::Client::new();

    tokio::spawn(async move {
        loop {
            match client.get(&config.url).timeout(PING_TIMEOUT).send().await {
                Ok(resp) => debug!(status = resp.status().as_u16(), "keepalive ping"),
                Err(e) => debug!(error = %e, "keepalive ping failed"),
            }
            tokio::time::sleep(config.interval).await;
        }
    })
}
