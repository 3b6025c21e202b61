//! Top-level client handle.
//!
//! # Data Flow
//! ```text
//! SyncClient::connect
//!     → Bootstrap (single flight) → Session installed in the slot
//!     → status board: connected, chain, owner
//!     → NotificationListener spawned once per session
//!
//! SyncClient::game → GameStore (reads the same slot)
//! SyncClient::events → EventBus subscription (chain.newBlock)
//! ```

use std::sync::Arc;

use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;

use crate::config::SyncConfig;
use crate::events::{ChainEvent, ChainStatus, EventBus, ListenerExit, NotificationListener, StatusBoard};
use crate::game::GameStore;
use crate::identity::{key_store_from_config, IdentityProvisioner, KeyStore};
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::session::{Bootstrap, BootstrapError, ConnectionState, Session, SessionSlot};
use crate::transport::{
    ApplicationId, ChainConnector, Faucet, HostEnvironment, HttpConnector, HttpFaucet,
    NodeServiceEnvironment, TransportError,
};

struct ListenerHandle {
    session: Arc<Session>,
    stop: Shutdown,
    task: JoinHandle<ListenerExit>,
}

/// Connection to the game application, shared by every game component.
pub struct SyncClient {
    bootstrap: Bootstrap,
    slot: SessionSlot,
    status: StatusBoard,
    bus: EventBus,
    store: GameStore,
    hub_application_id: Option<String>,
    listener: Mutex<Option<ListenerHandle>>,
}

impl SyncClient {
    /// Assemble a client from explicit transport and key-storage seams.
    pub fn new(
        config: &SyncConfig,
        environment: Arc<dyn HostEnvironment>,
        faucet: Arc<dyn Faucet>,
        keys: Arc<dyn KeyStore>,
        connector: Arc<dyn ChainConnector>,
    ) -> Self {
        let slot = SessionSlot::new();
        let status = StatusBoard::new(&config.events.default_region);
        let bus = EventBus::new(config.events.channel_capacity);
        let store = GameStore::new(slot.clone(), status.clone());
        let application_id = config
            .application
            .application_id
            .as_deref()
            .map(ApplicationId::from);

        let bootstrap = Bootstrap::new(
            environment,
            IdentityProvisioner::new(faucet, keys),
            connector,
            application_id,
            slot.clone(),
        );

        Self {
            bootstrap,
            slot,
            status,
            bus,
            store,
            hub_application_id: config.application.hub_application_id.clone(),
            listener: Mutex::new(None),
        }
    }

    /// Assemble a client talking HTTP to the configured faucet and node.
    pub fn from_config(config: &SyncConfig) -> Result<Self, TransportError> {
        let keys = key_store_from_config(&config.identity);
        let faucet = Arc::new(HttpFaucet::new(&config.faucet)?);
        let environment = Arc::new(NodeServiceEnvironment::new(
            config.environment.clone(),
            config.node.clone(),
            keys.clone(),
        ));
        let connector = Arc::new(HttpConnector::new(config.node.clone()));
        Ok(Self::new(config, environment, faucet, keys, connector))
    }

    /// Bootstrap a session (or join the one in flight) and start listening
    /// for notifications.
    ///
    /// Returns the live session when one is already installed.
    pub async fn connect(&self) -> Result<Arc<Session>, BootstrapError> {
        let session = self.bootstrap.connect().await?;
        if !self.slot.is_current(&session) {
            // Torn down or replaced after bootstrap returned.
            tracing::debug!(chain_id = %session.id(), "Session replaced before it was published");
            return Ok(session);
        }
        self.status.set_connected(&session);
        metrics::record_connected(true);
        self.ensure_listener(&session).await;
        Ok(session)
    }

    /// Drop the session and stop its listener.
    pub async fn disconnect(&self) {
        if let Some(handle) = self.listener.lock().await.take() {
            handle.stop.trigger();
            if let Err(e) = handle.task.await {
                tracing::warn!(error = %e, "Notification listener task failed");
            }
        }
        if let Some(session) = self.slot.current() {
            tracing::info!(chain_id = %session.id(), "Disconnecting");
        }
        self.slot.teardown();
        self.status.set_disconnected();
        metrics::record_connected(false);
    }

    pub fn state(&self) -> ConnectionState {
        self.slot.state()
    }

    pub fn status(&self) -> ChainStatus {
        self.status.snapshot()
    }

    pub fn session(&self) -> Option<Arc<Session>> {
        self.slot.current()
    }

    pub fn game(&self) -> &GameStore {
        &self.store
    }

    /// Subscribe to `chain.newBlock` events.
    pub fn events(&self) -> broadcast::Receiver<ChainEvent> {
        self.bus.subscribe()
    }

    /// Hub application that receives achievements, if configured.
    pub fn hub_application_id(&self) -> Option<&str> {
        self.hub_application_id.as_deref()
    }

    async fn ensure_listener(&self, session: &Arc<Session>) {
        let mut listener = self.listener.lock().await;
        if let Some(handle) = listener.as_ref() {
            if Arc::ptr_eq(&handle.session, session) && !handle.task.is_finished() {
                return;
            }
        }
        if let Some(stale) = listener.take() {
            stale.stop.trigger();
        }

        let notifications = match session.client().notifications().await {
            Ok(stream) => stream,
            Err(e) => {
                tracing::warn!(
                    chain_id = %session.id(),
                    error = %e,
                    "Notifications unavailable, continuing without them"
                );
                return;
            }
        };

        let stop = Shutdown::new();
        let task = NotificationListener::new(
            session.clone(),
            self.slot.clone(),
            self.store.clone(),
            self.bus.clone(),
            self.status.clone(),
        )
        .run(notifications, stop.subscribe());

        *listener = Some(ListenerHandle {
            session: session.clone(),
            stop,
            task: tokio::spawn(task),
        });
    }
}
