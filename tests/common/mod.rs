//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use traffic_capture::capture::channel_sink;
use traffic_capture::{AppConfig, CaptureOptions, HttpServer, LogEntry, Shutdown};

/// A running capture server plus the entries it produced.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub entries: mpsc::UnboundedReceiver<LogEntry>,
    pub handle: JoinHandle<Result<(), std::io::Error>>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Wait for the next finished exchange.
    pub async fn next_entry(&mut self) -> LogEntry {
        tokio::time::timeout(Duration::from_secs(5), self.entries.recv())
            .await
            .expect("timed out waiting for log entry")
            .expect("sink channel closed")
    }
}

/// Start the demo server on an ephemeral port, collecting entries in a channel.
/// The sink in `options` is replaced.
pub async fn start_capture_server(options: CaptureOptions) -> TestServer {
    let (tx, entries) = mpsc::unbounded_channel();
    let options = CaptureOptions {
        sink: Some(channel_sink(tx)),
        ..options
    };

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = HttpServer::with_options(AppConfig::default(), options).unwrap();
    let shutdown = Shutdown::new();
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));

    TestServer {
        addr,
        shutdown,
        entries,
        handle,
    }
}

/// Client that reports redirects instead of following them.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

/// Send a raw HTTP/1.1 request and read until the server closes.
#[allow(dead_code)]
pub async fn raw_request(addr: SocketAddr, request: &str) -> String {
    let mut socket = TcpStream::connect(addr).await.unwrap();
    socket.write_all(request.as_bytes()).await.unwrap();

    let mut response = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), socket.read_to_end(&mut response))
        .await
        .expect("timed out reading raw response")
        .unwrap();
    String::from_utf8_lossy(&response).into_owned()
}
