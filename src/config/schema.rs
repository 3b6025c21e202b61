//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the client.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the synchronization client.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SyncConfig {
    /// Application identifiers.
    pub application: ApplicationConfig,

    /// Faucet used for self-provisioning.
    pub faucet: FaucetConfig,

    /// Node service used for application requests and notifications.
    pub node: NodeConfig,

    /// Host-injected session settings.
    pub environment: EnvironmentConfig,

    /// Signing key persistence.
    pub identity: IdentityConfig,

    /// Caller-side bootstrap retry policy.
    pub reconnect: ReconnectConfig,

    /// Event bus and status settings.
    pub events: EventsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Application identifiers.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Game application to address. Without it every domain operation is unavailable.
    pub application_id: Option<String>,

    /// Achievement hub application, passed along with achievement submissions.
    pub hub_application_id: Option<String>,
}

/// Faucet configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FaucetConfig {
    /// Faucet GraphQL endpoint.
    pub url: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for FaucetConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8080".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Node service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Node service base URL; WebSocket notifications use `{url}/ws`.
    pub service_url: String,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            service_url: "http://localhost:8079".to_string(),
            request_timeout_secs: 30,
            connect_timeout_secs: 5,
        }
    }
}

/// Host-injected session configuration.
///
/// When enabled, the node service is assumed to already run a wallet with
/// `chain_id` as its default chain.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct EnvironmentConfig {
    /// Try the host session before self-provisioning.
    pub enabled: bool,

    /// Chain the host session is bound to.
    pub chain_id: Option<String>,

    /// Owner address of the host session; derived from the key store when unset.
    pub owner: Option<String>,
}

/// Where the signing key comes from.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum KeySource {
    /// New random key per session.
    #[default]
    Ephemeral,
    /// Hex key file, created on first use.
    File,
    /// Hex key in an environment variable.
    Env,
}

/// Signing key configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub key_source: KeySource,

    /// Key file path for `KeySource::File`.
    pub key_path: Option<String>,

    /// Variable name for `KeySource::Env`.
    pub key_env_var: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            key_source: KeySource::Ephemeral,
            key_path: None,
            key_env_var: "LEDGER_SYNC_PRIVATE_KEY".to_string(),
        }
    }
}

/// Retry policy for callers that re-run the bootstrap.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReconnectConfig {
    /// Maximum number of bootstrap attempts (0 = retry forever).
    pub max_attempts: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_ms: 500,
            max_delay_ms: 30_000,
        }
    }
}

/// Event bus configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Capacity of the broadcast channel; slow subscribers lag beyond it.
    pub channel_capacity: usize,

    /// Region shown until one has been read from the application.
    pub default_region: String,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 256,
            default_region: "world1".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of the human-readable format.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
