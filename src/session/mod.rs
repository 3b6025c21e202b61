//! Session subsystem.
//!
//! # Data Flow
//! ```text
//! connect() ──▶ Bootstrap (single flight)
//!                 Init → TryEnvironment ──ok──▶ Connected(Environment)
//!                           │ fail/absent
//!                           ▼
//!                        TrySelfProvision ──ok──▶ Connected(SelfProvisioned)
//!                           │ fail
//!                           ▼
//!                        Failed(cause)
//! Connected → Session installed in the SessionSlot (read by every domain operation)
//! ```
//!
//! # Design Decisions
//! - Exactly one bootstrap runs at a time; concurrent callers share its outcome
//! - No automatic retries; a failed outcome is dropped so the next call starts over
//! - Teardown empties the slot, which is what `Disconnected` means

pub mod bootstrap;
pub mod state;

pub use bootstrap::{Bootstrap, BootstrapError, BootstrapPhase};
pub use state::{ConnectedVia, ConnectionState, Session, SessionSlot};
