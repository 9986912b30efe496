//! Configuration validation logic.

use std::net::SocketAddr;

use crate::config::schema::ProxyConfig;

/// Error type for configuration validation failures.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError(pub String);

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Validation error: {}", self.0)
    }
}

/// Validate a ProxyConfig for semantic correctness.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    // 1. Addresses must parse
    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError(format!(
            "listener.bind_address '{}' is not a valid socket address",
            config.listener.bind_address
        )));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError(format!(
            "observability.metrics_address '{}' is not a valid socket address",
            config.observability.metrics_address
        )));
    }

    // 2. Connection cap
    if config.listener.max_connections == 0 {
        errors.push(ValidationError(
            "listener.max_connections must be > 0".to_string(),
        ));
    }

    // 3. Cache budget: a single entry must be able to fit
    if config.cache.max_entry_bytes == 0 {
        errors.push(ValidationError(
            "cache.max_entry_bytes must be > 0".to_string(),
        ));
    }
    if config.cache.max_entry_bytes > config.cache.max_cache_bytes {
        errors.push(ValidationError(format!(
            "cache.max_entry_bytes ({}) exceeds cache.max_cache_bytes ({})",
            config.cache.max_entry_bytes, config.cache.max_cache_bytes
        )));
    }

    // 4. Upstream
    if config.upstream.default_port == 0 {
        errors.push(ValidationError(
            "upstream.default_port must be in 1..=65535".to_string(),
        ));
    }
    if config.upstream.connect_timeout_secs == 0 {
        tracing::warn!("upstream.connect_timeout_secs is 0, connects will fail immediately");
    }

    // 5. Request limits window
    if config.limits.recv_chunk_bytes == 0 {
        errors.push(ValidationError(
            "limits.recv_chunk_bytes must be > 0".to_string(),
        ));
    }
    if config.limits.min_request_bytes == 0
        || config.limits.min_request_bytes > config.limits.max_request_bytes
    {
        errors.push(ValidationError(format!(
            "request length window [{}, {}] is empty",
            config.limits.min_request_bytes, config.limits.max_request_bytes
        )));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
