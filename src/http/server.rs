//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the demo handlers
//! - Wire up middleware (timeout, traffic capture, tracing)
//! - Bind server to listener and stop on shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::capture::{CaptureLayer, CaptureOptions};
use crate::config::AppConfig;
use crate::demo::{self, InMemoryColorStore};
use crate::error::CaptureError;
use crate::lifecycle::shutdown::wait_for_shutdown;

/// HTTP server for the demo API, with every exchange captured.
pub struct HttpServer {
    router: Router,
    config: AppConfig,
}

impl HttpServer {
    /// Create a server whose capture options come from the configuration.
    pub fn new(config: AppConfig) -> Result<Self, CaptureError> {
        let options = config.capture.to_options();
        Self::with_options(config, options)
    }

    /// Create a server with explicit capture options (e.g. a custom sink).
    pub fn with_options(config: AppConfig, options: CaptureOptions) -> Result<Self, CaptureError> {
        let capture = CaptureLayer::new(options)?;
        let router = Self::build_router(&config, capture);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, capture: CaptureLayer) -> Router {
        demo::routes(Arc::new(InMemoryColorStore::seeded()))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(capture)
            .layer(TraceLayer::new_for_http())
    }

    /// The fully layered router.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until Ctrl+C or a shutdown broadcast.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(wait_for_shutdown(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}
