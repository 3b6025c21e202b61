//! Startup orchestration shared by the binaries.

use std::path::Path;

use crate::config::{load_or_default, ConfigError, SyncConfig};
use crate::observability::{logging, metrics};

/// Config file used when no path is given.
pub const DEFAULT_CONFIG_PATH: &str = "ledger-sync.toml";

/// Load and validate the configuration, then bring up logging and metrics.
///
/// A missing file falls back to defaults; an invalid one is an error.
pub fn prepare(path: &Path) -> Result<SyncConfig, ConfigError> {
    let config = load_or_default(path)?;

    logging::init_logging(&config.observability);
    tracing::info!(
        path = %path.display(),
        faucet_url = %config.faucet.url,
        node_url = %config.node.service_url,
        application_id = config.application.application_id.as_deref().unwrap_or("<none>"),
        key_source = ?config.identity.key_source,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    Ok(config)
}
