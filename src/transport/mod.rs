//! Transport subsystem: the wire-level seams of the client.
//!
//! # Data Flow
//! ```text
//! Identity Provisioner ──▶ Faucet (wallet, chain claim)
//! Connection Bootstrap ──▶ HostEnvironment (adopt injected session)
//!                      └─▶ ChainConnector (build client for a claimed chain)
//! ChainClient ──▶ Application (query/mutation body in, raw response out)
//!             └─▶ notifications (push events for the session's chain)
//! ```
//!
//! # Design Decisions
//! - Every seam is a trait object so tests and hosts can substitute their own
//! - Applications exchange raw strings; encoding and decoding live in `codec`
//! - No timeouts are imposed here beyond what the HTTP client is configured with

pub mod http;
pub mod notifications;
pub mod types;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::identity::Signer;

pub use http::{HttpChainClient, HttpConnector, HttpFaucet, NodeServiceEnvironment};
pub use types::{
    ApplicationId, ChainId, Notification, NotificationReason, Owner, TransportError, Wallet,
};

/// Stream of push notifications for one chain.
pub type NotificationStream = mpsc::Receiver<Notification>;

/// Provisioning service issuing wallets and claiming chains.
#[async_trait]
pub trait Faucet: Send + Sync {
    /// Obtain a fresh wallet.
    async fn create_wallet(&self) -> Result<Wallet, TransportError>;

    /// Claim a new chain owned by `owner`.
    async fn claim_chain(&self, wallet: &Wallet, owner: &Owner) -> Result<ChainId, TransportError>;
}

/// A deployed application on a specific chain.
#[async_trait]
pub trait Application: Send + Sync {
    /// Send an encoded request and return the raw response payload.
    async fn query(&self, request: &str) -> Result<String, TransportError>;
}

/// Client bound to a signing identity and a chain.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Resolve an application identifier into a handle.
    async fn application(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Arc<dyn Application>, TransportError>;

    /// Subscribe to push notifications for the client's chain.
    async fn notifications(&self) -> Result<NotificationStream, TransportError>;
}

/// Builds a chain client from a self-provisioned identity.
#[async_trait]
pub trait ChainConnector: Send + Sync {
    async fn connect(
        &self,
        wallet: &Wallet,
        signer: Arc<dyn Signer>,
        chain_id: &ChainId,
    ) -> Result<Arc<dyn ChainClient>, TransportError>;
}

/// Session handed over by the hosting environment.
#[derive(Clone)]
pub struct EnvironmentSession {
    pub client: Arc<dyn ChainClient>,
    pub chain_id: ChainId,
    pub owner: Owner,
    pub signer: Arc<dyn Signer>,
}

/// Hosting environment that may already expose an initialized session.
#[async_trait]
pub trait HostEnvironment: Send + Sync {
    /// Returns `Ok(None)` when the host has no session to offer.
    async fn session(&self) -> Result<Option<EnvironmentSession>, TransportError>;
}

/// Environment without any injected session.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoEnvironment;

#[async_trait]
impl HostEnvironment for NoEnvironment {
    async fn session(&self) -> Result<Option<EnvironmentSession>, TransportError> {
        Ok(None)
    }
}
