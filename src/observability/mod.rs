//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events, one span per remote request)
//!     → metrics.rs (request counters and latency, bootstrap outcomes)
//!
//! Consumers:
//!     → stdout (pretty for development, JSON for production)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Request ID (UUID v4) attached to every remote request span
//! - Metrics are cheap (atomic increments) and no-ops until a recorder is installed
//! - Key material never reaches a log line

pub mod logging;
pub mod metrics;
