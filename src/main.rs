//! Ledger sync daemon.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌───────────────────────────────────────────────┐
//!                 │                  SyncClient                    │
//!                 │                                                │
//!   host session ─┼─▶┌───────────┐    ┌──────────┐                 │
//!                 │  │ bootstrap │───▶│ session  │◀── GameStore ◀──┼── game components
//!   faucet ◀──────┼──│   (FSM)   │    │   slot   │       │         │
//!                 │  └───────────┘    └────┬─────┘       ▼         │
//!                 │        │               │          codec        │
//!                 │        ▼               ▼             │         │
//!                 │    identity      notifications       ▼         │
//!                 │  (keys, faucet)   listener ──▶ application ────┼──▶ node service
//!                 │                      │                         │
//!                 │                      ▼                         │
//!                 │               status + event bus ─────────────┼──▶ UI
//!                 └───────────────────────────────────────────────┘
//! ```
//!
//! Connects with exponential backoff, then logs status and `chain.newBlock`
//! events until SIGINT/SIGTERM. A closed notification stream triggers a
//! reconnect.

use std::path::PathBuf;

use ledger_sync::lifecycle::{self, Shutdown, DEFAULT_CONFIG_PATH};
use ledger_sync::resilience::reconnect_delay;
use ledger_sync::{SyncClient, SyncConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let config = lifecycle::prepare(&path)?;

    tracing::info!("ledger-sync v{} starting", env!("CARGO_PKG_VERSION"));

    let client = SyncClient::from_config(&config)?;
    let shutdown = Shutdown::new();

    let signal = shutdown.clone();
    tokio::spawn(async move {
        lifecycle::wait_for_signal().await;
        signal.trigger();
    });

    run(&client, &config, &shutdown).await;

    client.disconnect().await;
    tracing::info!("Shutdown complete");
    Ok(())
}

/// Connect, follow events, reconnect when the session drops.
async fn run(client: &SyncClient, config: &SyncConfig, shutdown: &Shutdown) {
    let mut stop = shutdown.subscribe();
    loop {
        if !connect_with_backoff(client, config, shutdown).await {
            return;
        }
        let status = client.status();
        tracing::info!(
            chain_id = ?status.chain_id,
            owner = ?status.owner,
            world_region = %status.world_region,
            "Session ready"
        );
        if let Some(region) = client.game().get_world_region().await {
            tracing::info!(world_region = %region, "World region");
        }

        let mut events = client.events();
        loop {
            tokio::select! {
                _ = stop.recv() => return,
                event = events.recv() => match event {
                    Ok(event) => tracing::info!(
                        topic = event.topic,
                        block = %event.block,
                        world_region = %client.status().world_region,
                        "Chain event"
                    ),
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Event consumer lagging");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => return,
                },
                _ = tokio::time::sleep(std::time::Duration::from_secs(5)) => {
                    if !client.state().is_connected() {
                        tracing::warn!("Session lost, reconnecting");
                        break;
                    }
                }
            }
        }
    }
}

/// Returns false when attempts are exhausted or shutdown was requested.
async fn connect_with_backoff(client: &SyncClient, config: &SyncConfig, shutdown: &Shutdown) -> bool {
    let mut stop = shutdown.subscribe();
    let max_attempts = config.reconnect.max_attempts;
    let mut attempt = 0u32;
    loop {
        match client.connect().await {
            Ok(_) => return true,
            Err(e) => {
                attempt += 1;
                if max_attempts != 0 && attempt >= max_attempts {
                    tracing::error!(attempts = attempt, error = %e, "Giving up connecting");
                    return false;
                }
                let delay = reconnect_delay(&config.reconnect, attempt);
                tracing::warn!(attempt, delay_ms = delay.as_millis() as u64, error = %e, "Connect failed, retrying");
                tokio::select! {
                    _ = stop.recv() => return false,
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }
    }
}
