//! Ledger-backed game state synchronization client.
//!
//! Connects a game to a per-player microchain: adopts a host-provided session
//! or provisions one through a faucet, then persists player state, inventory,
//! quests, battles, guilds and achievements through a single application.

pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod events;
pub mod game;
pub mod identity;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod session;
pub mod transport;

pub use client::SyncClient;
pub use config::SyncConfig;
pub use error::{SyncError, SyncResult};
pub use lifecycle::Shutdown;
