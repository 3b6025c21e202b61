//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate endpoints parse as http(s) URLs
//! - Validate value ranges (timeouts > 0, backoff bounds)
//! - Check that the selected key source has what it needs
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: SyncConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::{KeySource, SyncConfig};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &SyncConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_url(&mut errors, "faucet.url", &config.faucet.url);
    check_url(&mut errors, "node.service_url", &config.node.service_url);

    if config.faucet.timeout_secs == 0 {
        errors.push(ValidationError::new("faucet.timeout_secs", "must be greater than 0"));
    }
    if config.node.request_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "node.request_timeout_secs",
            "must be greater than 0",
        ));
    }
    if config.node.connect_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "node.connect_timeout_secs",
            "must be greater than 0",
        ));
    }

    check_identifier(
        &mut errors,
        "application.application_id",
        config.application.application_id.as_deref(),
    );
    check_identifier(
        &mut errors,
        "application.hub_application_id",
        config.application.hub_application_id.as_deref(),
    );

    if config.environment.enabled && config.environment.chain_id.is_none() {
        errors.push(ValidationError::new(
            "environment.chain_id",
            "required when the environment session is enabled",
        ));
    }
    check_identifier(
        &mut errors,
        "environment.chain_id",
        config.environment.chain_id.as_deref(),
    );

    match config.identity.key_source {
        KeySource::File if config.identity.key_path.as_deref().unwrap_or("").is_empty() => {
            errors.push(ValidationError::new(
                "identity.key_path",
                "required when key_source = \"file\"",
            ));
        }
        KeySource::Env if config.identity.key_env_var.is_empty() => {
            errors.push(ValidationError::new(
                "identity.key_env_var",
                "required when key_source = \"env\"",
            ));
        }
        _ => {}
    }

    if config.reconnect.base_delay_ms > config.reconnect.max_delay_ms {
        errors.push(ValidationError::new(
            "reconnect.base_delay_ms",
            "must not exceed reconnect.max_delay_ms",
        ));
    }

    if config.events.channel_capacity == 0 {
        errors.push(ValidationError::new(
            "events.channel_capacity",
            "must be greater than 0",
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    match url::Url::parse(value) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(ValidationError::new(
            field,
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new(field, format!("invalid URL: {}", e))),
    }
}

/// Identifiers end up in URL paths; keep them to plain tokens.
fn check_identifier(errors: &mut Vec<ValidationError>, field: &'static str, value: Option<&str>) {
    if let Some(value) = value {
        let valid = !value.is_empty()
            && value
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            errors.push(ValidationError::new(
                field,
                format!("'{}' is not a valid identifier", value),
            ));
        }
    }
}
