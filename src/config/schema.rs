//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.
//! The defaults carry the proxy's compile-time tuning constants; a TOML
//! file may override any of them.

use serde::{Deserialize, Serialize};

/// Root configuration for the forwarding proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address, connection cap).
    pub listener: ListenerConfig,

    /// Response cache sizing.
    pub cache: CacheConfig,

    /// Upstream connection settings.
    pub upstream: UpstreamConfig,

    /// Request read limits.
    pub limits: RequestLimits,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080"). The CLI port replaces the
    /// port component at startup.
    pub bind_address: String,

    /// Maximum concurrent client connections. Also used as the listen
    /// backlog. Admission blocks, it never rejects.
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_connections: 400,
        }
    }
}

/// Response cache sizing.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Total byte budget for the cache, bookkeeping included.
    pub max_cache_bytes: usize,

    /// Largest response blob the cache will accept.
    pub max_entry_bytes: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_cache_bytes: 200 * 1024 * 1024,
            max_entry_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Upstream connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Port dialed on every origin server. The URI's port component is
    /// not consulted.
    pub default_port: u16,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            default_port: 80,
            connect_timeout_secs: 5,
        }
    }
}

/// Request read limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RequestLimits {
    /// Socket read chunk size, for both the client request and the
    /// origin response.
    pub recv_chunk_bytes: usize,

    /// Shortest byte sequence accepted as a request.
    pub min_request_bytes: usize,

    /// Read cap while waiting for the header terminator. Requests that
    /// reach this length without one are treated as malformed.
    pub max_request_bytes: usize,
}

impl Default for RequestLimits {
    fn default() -> Self {
        Self {
            recv_chunk_bytes: 4096,
            min_request_bytes: 4,
            max_request_bytes: 65535,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
