//! Domain operations facade.
//!
//! # Data Flow
//! ```text
//! caller (quest tracking, battle resolution, UI)
//!     → GameStore method (typed arguments)
//!     → precondition: live session with an application handle
//!     → codec::encode → Application::query → codec::decode
//!     → typed value | failure sentinel (false / None), cause logged
//! ```
//!
//! # Design Decisions
//! - One query or one mutation per operation; no retries, no result caching
//! - Errors never escape: persistence is best-effort for the host game
//! - Composite helpers (quest append/update, battle history) are load-then-write
//!   and can lose updates under concurrent writers

pub mod battle;
pub mod guild;
pub mod player;
pub mod store;
pub mod types;
pub mod world;

pub use store::GameStore;
pub use types::{Achievement, BattleRecord, BattleResult, Guild, InventoryList, PlayerState, QuestList};
