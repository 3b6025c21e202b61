//! Chain identifiers, wallet data and transport error definitions.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier of a microchain claimed from the faucet or supplied by the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainId(pub String);

impl ChainId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ChainId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ChainId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a deployed application.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(pub String);

impl ApplicationId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ApplicationId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Owner address derived from a signing key (`0x`-prefixed hex).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Owner(String);

impl Owner {
    /// Parse an owner address.
    ///
    /// Accepts a `0x` prefix followed by at least one hex digit.
    pub fn parse(address: &str) -> Result<Self, String> {
        let digits = address
            .strip_prefix("0x")
            .ok_or_else(|| format!("owner address '{}' is missing the 0x prefix", address))?;
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!("owner address '{}' is not hex", address));
        }
        Ok(Self(address.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Wallet issued by the faucet.
///
/// Holds the network's genesis description; the client treats it as opaque.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    pub genesis_config: serde_json::Value,
}

/// Push notification delivered for a chain.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub chain_id: ChainId,
    pub reason: NotificationReason,
}

/// Why a notification was sent.
#[derive(Debug, Clone, PartialEq)]
pub enum NotificationReason {
    /// A new block was added to the chain; carries the opaque block payload.
    NewBlock(serde_json::Value),
    /// Any other reason (new incoming message, new round, ...).
    Other(serde_json::Value),
}

impl Notification {
    /// Interpret a raw notification payload.
    ///
    /// The reason is an externally tagged object; `{"NewBlock": {...}}` marks a new block.
    pub fn from_payload(payload: &serde_json::Value) -> Option<Self> {
        let chain_id = payload
            .get("chain_id")
            .or_else(|| payload.get("chainId"))
            .and_then(|v| v.as_str())?;
        let reason = payload.get("reason")?;
        let reason = match reason.get("NewBlock") {
            Some(block) => NotificationReason::NewBlock(block.clone()),
            None => NotificationReason::Other(reason.clone()),
        };
        Some(Self {
            chain_id: ChainId::from(chain_id),
            reason,
        })
    }
}

/// Errors raised while talking to the faucet or the node service.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TransportError {
    /// Request could not be sent or the connection broke.
    #[error("network error: {0}")]
    Network(String),

    /// Remote endpoint answered with a non-success status.
    #[error("remote returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Endpoint URL could not be parsed or used.
    #[error("invalid endpoint '{0}'")]
    InvalidEndpoint(String),

    /// WebSocket subscription failed.
    #[error("subscription error: {0}")]
    Subscription(String),

    /// Requested resource does not exist on the remote side.
    #[error("not found: {0}")]
    NotFound(String),

    /// Remote side answered but refused the request.
    #[error("remote rejected request: {0}")]
    Rejected(String),

    /// Remote side answered with a payload that could not be interpreted.
    #[error("malformed reply: {0}")]
    Malformed(String),

    /// Host environment could not provide a session.
    #[error("environment session unavailable: {0}")]
    Unavailable(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => TransportError::Status {
                status: status.as_u16(),
                body: e.to_string(),
            },
            None => TransportError::Network(e.to_string()),
        }
    }
}
