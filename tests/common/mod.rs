//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use forward_proxy::config::ProxyConfig;
use forward_proxy::lifecycle::Shutdown;
use forward_proxy::net::Listener;
use forward_proxy::ProxyServer;

/// Mock origin server answering every connection with a fixed response.
pub struct MockOrigin {
    pub addr: SocketAddr,
    connections: Arc<AtomicUsize>,
}

impl MockOrigin {
    /// Number of connections the origin has accepted so far.
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

/// Start a mock origin on an ephemeral loopback port that replies with
/// a well-formed HTTP response carrying `body`.
pub async fn start_origin(body: &str) -> MockOrigin {
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    );
    start_origin_raw(response.into_bytes()).await
}

/// Start a mock origin that writes `response` verbatim and closes.
pub async fn start_origin_raw(response: Vec<u8>) -> MockOrigin {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let connections = Arc::new(AtomicUsize::new(0));
    let accepted = connections.clone();
    let response = Arc::new(response);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    accepted.fetch_add(1, Ordering::SeqCst);
                    let response = Arc::clone(&response);
                    tokio::spawn(async move {
                        // drain the request head before replying
                        let mut buf = [0u8; 4096];
                        let _ = socket.read(&mut buf).await;
                        let _ = socket.write_all(&response).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    MockOrigin { addr, connections }
}

/// A proxy running in the background. Dropping it shuts the server down.
pub struct TestProxy {
    pub addr: SocketAddr,
    _shutdown: Shutdown,
}

/// Start a proxy on an ephemeral loopback port with the given config.
pub async fn start_proxy(mut config: ProxyConfig) -> TestProxy {
    config.listener.bind_address = "127.0.0.1:0".to_string();
    let listener = Listener::bind(&config.listener).unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let server = ProxyServer::new(config);
        server.run(listener, rx).await;
    });

    TestProxy {
        addr,
        _shutdown: shutdown,
    }
}

/// Config pointing every upstream dial at `origin_port` on loopback.
pub fn proxy_config(origin_port: u16) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.upstream.default_port = origin_port;
    config
}
