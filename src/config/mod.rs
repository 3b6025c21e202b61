//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize, environment overrides)
//!     → validation.rs (semantic checks)
//!     → SyncConfig (validated, immutable)
//!     → handed to SyncClient::from_config
//! ```
//!
//! # Design Decisions
//! - All fields have defaults so an empty file (or no file) is a valid local setup
//! - Host-supplied environment variables override file values
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_or_default, ConfigError};
pub use schema::{
    ApplicationConfig, EnvironmentConfig, EventsConfig, FaucetConfig, IdentityConfig, KeySource,
    NodeConfig, ObservabilityConfig, ReconnectConfig, SyncConfig,
};
