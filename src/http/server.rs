//! Proxy server setup and accept loop.
//!
//! # Responsibilities
//! - Own the shared response cache
//! - Accept admitted connections from the bounded listener
//! - Spawn one forwarder task per connection, permit held for its
//!   whole lifetime
//! - Keep the accept loop alive through accept errors
//! - Stop accepting on shutdown signal

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::cache::ResponseCache;
use crate::config::ProxyConfig;
use crate::http::forwarder::Forwarder;
use crate::net::Listener;
use crate::observability::metrics;

/// Accept loop wiring the bounded listener, the shared cache, and
/// per-connection forwarders.
pub struct ProxyServer {
    config: ProxyConfig,
    cache: Arc<ResponseCache>,
}

impl ProxyServer {
    /// Create a server with a fresh cache sized from `config`.
    pub fn new(config: ProxyConfig) -> Self {
        let cache = Arc::new(ResponseCache::new(
            config.cache.max_cache_bytes,
            config.cache.max_entry_bytes,
        ));
        Self { config, cache }
    }

    /// Handle to the shared cache, for diagnostics.
    pub fn cache(&self) -> Arc<ResponseCache> {
        Arc::clone(&self.cache)
    }

    /// Run the accept loop until the shutdown signal fires.
    ///
    /// Accept errors are logged and the loop continues; per-connection
    /// errors never reach this loop.
    pub async fn run(&self, listener: Listener, mut shutdown: broadcast::Receiver<()>) {
        let forwarder = Forwarder::new(Arc::clone(&self.cache), &self.config);

        tracing::info!(
            max_connections = listener.max_connections(),
            "Proxy server accepting connections"
        );

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, peer, permit)) => {
                            let _ = stream.set_nodelay(true);
                            metrics::record_connection_accepted();
                            let forwarder = forwarder.clone();
                            tokio::spawn(async move {
                                forwarder.run(stream, peer).await;
                                drop(permit);
                            });
                        }
                        Err(error) => {
                            tracing::warn!(error = %error, "Accept failed");
                            continue;
                        }
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!(
                        cached_entries = self.cache.len(),
                        cached_bytes = self.cache.total_bytes(),
                        "Shutdown signal received, stopping accept loop"
                    );
                    break;
                }
            }
        }
    }
}
