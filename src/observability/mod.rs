//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Capture layer produces:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Correlation id flows through request extensions and log events
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
