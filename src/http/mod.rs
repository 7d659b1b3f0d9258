//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → capture layer (correlation id, body taps)
//!     → demo handlers
//!     → Send to client
//! ```

pub mod server;

pub use server::HttpServer;
