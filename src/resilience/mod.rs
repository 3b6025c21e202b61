//! Resilience helpers.
//!
//! # Data Flow
//! ```text
//! Bootstrap failed (daemon / CLI):
//!     → backoff.rs (delay for attempt n, capped, jittered)
//!     → sleep → SyncClient::connect again, up to reconnect.max_attempts
//! ```
//!
//! # Design Decisions
//! - The library never retries on its own; callers own the retry loop
//! - Jitter spreads reconnects of many clients after a faucet outage

pub mod backoff;

pub use backoff::{calculate_backoff, reconnect_delay};
