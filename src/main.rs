//! Forwarding HTTP proxy binary.
//!
//! Usage: `forward-proxy <port> [--config <path>]`. Runs until killed;
//! exits 1 when the arguments or the configuration are unusable.

use std::path::PathBuf;
use std::process;

use clap::Parser;

use forward_proxy::config::loader::load_config;
use forward_proxy::lifecycle::{shutdown, Shutdown};
use forward_proxy::net::Listener;
use forward_proxy::observability;
use forward_proxy::{ProxyConfig, ProxyServer};

#[derive(Parser)]
#[command(name = "forward-proxy")]
#[command(about = "Forwarding HTTP proxy with an in-memory LRU response cache", long_about = None)]
struct Cli {
    /// Port to listen on, in 1..=65535.
    port: u16,

    /// Optional TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            // help and version go to stdout and are not failures
            process::exit(if error.use_stderr() { 1 } else { 0 });
        }
    };
    if cli.port == 0 {
        eprintln!("port must be in 1..=65535");
        process::exit(1);
    }

    let mut config = match &cli.config {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(error) => {
                eprintln!("failed to load {}: {error}", path.display());
                process::exit(1);
            }
        },
        None => ProxyConfig::default(),
    };

    // the CLI port replaces the port component of the bind address
    let bind_host = config
        .listener
        .bind_address
        .rsplit_once(':')
        .map(|(host, _)| host.to_string())
        .unwrap_or_else(|| "0.0.0.0".to_string());
    config.listener.bind_address = format!("{bind_host}:{}", cli.port);

    observability::logging::init(&config.observability.log_level);

    tracing::info!("forward-proxy v0.1.0 starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        max_cache_bytes = config.cache.max_cache_bytes,
        max_entry_bytes = config.cache.max_entry_bytes,
        upstream_port = config.upstream.default_port,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            observability::metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let listener = match Listener::bind(&config.listener) {
        Ok(listener) => listener,
        Err(error) => {
            tracing::error!(error = %error, "Failed to bind listener");
            process::exit(1);
        }
    };

    let coordinator = Shutdown::new();
    let shutdown_rx = coordinator.subscribe();
    tokio::spawn(async move {
        shutdown::wait_for_signal().await;
        coordinator.trigger();
    });

    let server = ProxyServer::new(config);
    server.run(listener, shutdown_rx).await;

    tracing::info!("Shutdown complete");
}
