//! Traffic capture demo server.
//!
//! Serves the colors API behind the capture layer and prints one block per
//! exchange (or emits it as a tracing event, per config).
//!
//! ```text
//!     Client ──▶ TraceLayer ──▶ CaptureLayer ──▶ TimeoutLayer ──▶ colors API
//!                                    │
//!                                    ▼
//!                             LogEntry ──▶ sink (console / tracing)
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use traffic_capture::config::{load_config, AppConfig};
use traffic_capture::observability::{logging, metrics};
use traffic_capture::{HttpServer, Shutdown};

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "traffic-capture", version, about = "HTTP traffic capture demo server")]
struct Cli {
    /// Path to a TOML config file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init(&config.observability)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "traffic-capture starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        sink = ?config.capture.sink,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        "Listening for connections"
    );

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
