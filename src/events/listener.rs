//! Notification listener.
//!
//! # Responsibilities
//! - Consume the session's push stream, one notification at a time
//! - On a new block: refresh the world region, then publish `chain.newBlock`
//! - When the stream closes: tear the session down and clear the status
//!
//! # Design Decisions
//! - Region refresh failures are swallowed; the cached region stays
//! - A slow refresh delays the next notification, nothing is dropped
//! - Shutdown stops the loop without touching the session

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::events::bus::{ChainEvent, EventBus};
use crate::events::status::StatusBoard;
use crate::game::GameStore;
use crate::observability::metrics;
use crate::session::{Session, SessionSlot};
use crate::transport::{Notification, NotificationReason, NotificationStream};

/// Why [`NotificationListener::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerExit {
    /// The push stream closed; the session was torn down.
    StreamClosed,
    /// Shutdown was requested.
    Shutdown,
}

/// Drives one session's push stream.
pub struct NotificationListener {
    session: Arc<Session>,
    slot: SessionSlot,
    store: GameStore,
    bus: EventBus,
    status: StatusBoard,
}

impl NotificationListener {
    pub fn new(
        session: Arc<Session>,
        slot: SessionSlot,
        store: GameStore,
        bus: EventBus,
        status: StatusBoard,
    ) -> Self {
        Self {
            session,
            slot,
            store,
            bus,
            status,
        }
    }

    pub async fn run(
        self,
        mut notifications: NotificationStream,
        mut shutdown: broadcast::Receiver<()>,
    ) -> ListenerExit {
        tracing::info!(chain_id = %self.session.id(), "Notification listener started");
        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!(chain_id = %self.session.id(), "Notification listener stopping");
                    return ListenerExit::Shutdown;
                }
                next = notifications.recv() => match next {
                    Some(notification) => self.handle(notification).await,
                    None => {
                        self.close();
                        return ListenerExit::StreamClosed;
                    }
                },
            }
        }
    }

    async fn handle(&self, notification: Notification) {
        if &notification.chain_id != self.session.id() {
            tracing::debug!(chain_id = %notification.chain_id, "Ignoring notification for another chain");
            return;
        }
        match notification.reason {
            NotificationReason::NewBlock(block) => {
                tracing::debug!(chain_id = %notification.chain_id, "New block");
                if self.store.get_world_region().await.is_none() {
                    tracing::debug!("Region refresh failed, keeping cached value");
                }
                self.bus.emit(ChainEvent::new_block(block));
            }
            NotificationReason::Other(reason) => {
                tracing::trace!(reason = %reason, "Notification ignored");
            }
        }
    }

    fn close(&self) {
        tracing::warn!(chain_id = %self.session.id(), "Notification stream closed");
        // A newer session may already be installed; leave it alone.
        if self.slot.teardown_if(&self.session) {
            self.status.set_disconnected();
            metrics::record_connected(false);
            tracing::info!(chain_id = %self.session.id(), "Session torn down");
        }
    }
}
