//! Session data and the shared session slot.

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use serde::Serialize;

use crate::identity::{KeyStoreError, Signer};
use crate::transport::{Application, ChainClient, ChainId, Owner};

/// How the session was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectedVia {
    /// Adopted from the hosting environment.
    Environment,
    /// Created through the faucet.
    SelfProvisioned,
}

impl ConnectedVia {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectedVia::Environment => "environment",
            ConnectedVia::SelfProvisioned => "self_provisioned",
        }
    }
}

/// Connection state of a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected(ConnectedVia),
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected(_))
    }
}

/// Live binding of a signing identity to a chain.
pub struct Session {
    id: ChainId,
    owner: Owner,
    signer: Arc<dyn Signer>,
    client: Arc<dyn ChainClient>,
    application: Option<Arc<dyn Application>>,
    via: ConnectedVia,
}

impl Session {
    pub fn new(
        id: ChainId,
        owner: Owner,
        signer: Arc<dyn Signer>,
        client: Arc<dyn ChainClient>,
        application: Option<Arc<dyn Application>>,
        via: ConnectedVia,
    ) -> Self {
        Self {
            id,
            owner,
            signer,
            client,
            application,
            via,
        }
    }

    /// Chain identity of the session.
    pub fn id(&self) -> &ChainId {
        &self.id
    }

    pub fn owner(&self) -> &Owner {
        &self.owner
    }

    pub fn signer(&self) -> &Arc<dyn Signer> {
        &self.signer
    }

    pub fn client(&self) -> &Arc<dyn ChainClient> {
        &self.client
    }

    /// Resolved application handle; `None` when no application id was configured.
    pub fn application(&self) -> Option<&Arc<dyn Application>> {
        self.application.as_ref()
    }

    pub fn via(&self) -> ConnectedVia {
        self.via
    }

    /// Derive an auth token for a cross-chain player transfer.
    ///
    /// Signs `"{player_id}:{destination_chain}"` with the session key.
    pub async fn sign_transfer_token(
        &self,
        player_id: &str,
        destination_chain: &ChainId,
    ) -> Result<String, KeyStoreError> {
        let message = format!("{}:{}", player_id, destination_chain);
        self.signer.sign_message(message.as_bytes()).await
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("owner", &self.owner)
            .field("has_application", &self.application.is_some())
            .field("via", &self.via)
            .finish()
    }
}

/// Shared holder of the current session.
///
/// Empty means `Disconnected`.
#[derive(Clone, Default)]
pub struct SessionSlot {
    inner: Arc<ArcSwapOption<Session>>,
}

impl SessionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Arc<Session>> {
        self.inner.load_full()
    }

    /// True while `session` is the installed one.
    pub fn is_current(&self, session: &Arc<Session>) -> bool {
        match &*self.inner.load() {
            Some(current) => Arc::ptr_eq(current, session),
            None => false,
        }
    }

    pub fn install(&self, session: Arc<Session>) {
        self.inner.store(Some(session));
    }

    /// Drop the current session.
    pub fn teardown(&self) {
        if self.inner.swap(None).is_some() {
            tracing::warn!("Session torn down");
        }
    }

    /// Drop the session only if it is still `session`.
    ///
    /// Returns false when a newer session has been installed meanwhile.
    pub fn teardown_if(&self, session: &Arc<Session>) -> bool {
        let expected = Some(Arc::clone(session));
        let previous = self.inner.compare_and_swap(&expected, None);
        let swapped = match &*previous {
            Some(p) => Arc::ptr_eq(p, session),
            None => false,
        };
        if swapped {
            tracing::warn!(chain_id = %session.id(), "Session torn down");
        }
        swapped
    }

    pub fn state(&self) -> ConnectionState {
        match &*self.inner.load() {
            Some(session) => ConnectionState::Connected(session.via),
            None => ConnectionState::Disconnected,
        }
    }
}
