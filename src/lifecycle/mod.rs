//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Initialize logging/metrics → Bind listener
//!
//! Shutdown (shutdown.rs):
//!     Ctrl+C or broadcast → Stop accepting → Drain connections → Exit
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then observability, then listener
//! - In-flight exchanges finish and reach the sink before exit

pub mod shutdown;

pub use shutdown::Shutdown;
