//! Outward-facing status and events.
//!
//! # Data Flow
//! ```text
//! ChainClient::notifications (push stream)
//!     → listener.rs (one notification at a time, arrival order)
//!         → GameStore::get_world_region → status.rs (cached region)
//!         → bus.rs (chain.newBlock event)
//!     → stream closed: session torn down, status cleared
//!
//! SyncClient::connect / disconnect → status.rs (connected, chain, owner)
//! ```
//!
//! # Design Decisions
//! - No rendering here: a presentation layer subscribes to the bus and reads
//!   the status snapshot
//! - Status is an immutable snapshot swapped atomically; readers never block
//! - Broadcast bus: a lagging subscriber misses events, the listener never waits

pub mod bus;
pub mod listener;
pub mod status;

pub use bus::{ChainEvent, EventBus, NEW_BLOCK_TOPIC};
pub use listener::{ListenerExit, NotificationListener};
pub use status::{ChainStatus, StatusBoard};
