//! Configuration loading from disk and the host environment.

use std::fs;
use std::path::Path;

use crate::config::schema::SyncConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Faucet endpoint supplied by the host.
pub const FAUCET_URL_ENV: &str = "LINERA_FAUCET_URL";
/// Application identifier supplied by the host.
pub const APPLICATION_ID_ENV: &str = "LINERA_APPLICATION_ID";
/// Node service URL supplied by the host.
pub const NODE_URL_ENV: &str = "LINERA_NODE_URL";
/// Chain of a host-injected session.
pub const CHAIN_ID_ENV: &str = "LINERA_CHAIN_ID";
/// Owner of a host-injected session.
pub const OWNER_ENV: &str = "LINERA_OWNER";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load, apply environment overrides and validate a TOML file.
pub fn load_config(path: &Path) -> Result<SyncConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let mut config: SyncConfig = toml::from_str(&content).map_err(ConfigError::Parse)?;

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Like [`load_config`], but a missing file yields the defaults.
pub fn load_or_default(path: &Path) -> Result<SyncConfig, ConfigError> {
    if path.exists() {
        return load_config(path);
    }
    tracing::info!(path = %path.display(), "No config file, using defaults");
    let mut config = SyncConfig::default();
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Overlay host-supplied values onto a parsed configuration.
pub fn apply_env_overrides<F>(config: &mut SyncConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(url) = lookup(FAUCET_URL_ENV) {
        config.faucet.url = url;
    }
    if let Some(id) = lookup(APPLICATION_ID_ENV) {
        config.application.application_id = Some(id);
    }
    if let Some(url) = lookup(NODE_URL_ENV) {
        config.node.service_url = url;
    }
    if let Some(chain) = lookup(CHAIN_ID_ENV) {
        config.environment.enabled = true;
        config.environment.chain_id = Some(chain);
    }
    if let Some(owner) = lookup(OWNER_ENV) {
        config.environment.owner = Some(owner);
    }
}
