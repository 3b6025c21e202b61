//! Connection status snapshot.

use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::Serialize;

use crate::session::{ConnectedVia, Session};
use crate::transport::{ChainId, Owner};

/// What a status display shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainStatus {
    pub connected: bool,
    pub chain_id: Option<ChainId>,
    pub owner: Option<Owner>,
    pub world_region: String,
    pub via: Option<ConnectedVia>,
}

/// Shared, lock-free holder of the current [`ChainStatus`].
#[derive(Clone)]
pub struct StatusBoard {
    current: Arc<ArcSwap<ChainStatus>>,
}

impl StatusBoard {
    pub fn new(default_region: &str) -> Self {
        let status = ChainStatus {
            connected: false,
            chain_id: None,
            owner: None,
            world_region: default_region.to_string(),
            via: None,
        };
        Self {
            current: Arc::new(ArcSwap::from_pointee(status)),
        }
    }

    pub fn snapshot(&self) -> ChainStatus {
        ChainStatus::clone(&self.current.load())
    }

    /// Reflect a freshly installed session. The cached region is kept.
    pub fn set_connected(&self, session: &Session) {
        self.current.rcu(|status| ChainStatus {
            connected: true,
            chain_id: Some(session.id().clone()),
            owner: Some(session.owner().clone()),
            world_region: status.world_region.clone(),
            via: Some(session.via()),
        });
    }

    pub fn set_disconnected(&self) {
        self.current.rcu(|status| ChainStatus {
            connected: false,
            chain_id: None,
            owner: None,
            world_region: status.world_region.clone(),
            via: None,
        });
    }

    /// Replace the cached region; the last successful read wins.
    pub fn set_region(&self, region: &str) {
        self.current.rcu(|status| ChainStatus {
            world_region: region.to_string(),
            ..ChainStatus::clone(status)
        });
    }
}
