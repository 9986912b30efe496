//! Upstream address resolution.
//!
//! Thin wrapper over the runtime's DNS lookup; the forwarder consumes
//! only this function, so tests can point hostnames at loopback
//! addresses by overriding the upstream port in config.

use std::io;
use std::net::SocketAddr;

use tokio::net::lookup_host;

/// Resolve `host:port` to the first usable socket address.
pub async fn resolve(host: &str, port: u16) -> io::Result<SocketAddr> {
    let mut addrs = lookup_host((host, port)).await?;
    addrs.next().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("no addresses found for {host}"),
        )
    })
}
