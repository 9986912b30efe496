//! Per-connection forwarding state machine.
//!
//! # State Machine
//! ```text
//! READ_REQUEST ──read error / zero bytes──▶ DONE
//!    │ recv until "\r\n\r\n" or the length cap
//!    ▼
//! CACHE_LOOKUP ──hit──▶ write cached blob ──▶ DONE
//!    │ miss
//!    ▼
//! RESOLVE_UPSTREAM ──parse / Host / DNS / connect error──▶ DONE
//!    │ dial Host header host, configured upstream port
//!    ▼
//! FORWARD_REQUEST ──send error──▶ DONE (upstream dropped)
//!    │ raw client bytes, verbatim
//!    ▼
//! STREAM_RESPONSE ── loop: recv upstream → send client → tee staging
//!    │ client-send error: stop early, commit what was captured
//!    │ staging past the entry cap: drop staging, keep forwarding
//!    ▼
//! COMMIT ──staging non-empty──▶ cache.insert(raw request, staging) ──▶ DONE
//! ```
//!
//! # Design Decisions
//! - The cache key is the exact raw request bytes; any header variation
//!   is a different key
//! - The upstream host comes from the parsed `Host` header, the port
//!   from config; the URI's host and port are not consulted
//! - No cache lock is held across any socket operation
//! - On parse or upstream failure the client connection closes with no
//!   response bytes written

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use uuid::Uuid;

use crate::cache::ResponseCache;
use crate::config::{ProxyConfig, RequestLimits, UpstreamConfig};
use crate::http::request::{ParseError, Request};
use crate::net::resolver;
use crate::observability::metrics;

/// Why a connection ended without a forwarded response.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("client closed before sending a request")]
    EmptyRequest,
    #[error("client closed mid-request")]
    TruncatedRequest,
    #[error(transparent)]
    BadRequest(#[from] ParseError),
    #[error("request has no Host header")]
    MissingHost,
    #[error("failed to resolve '{host}': {source}")]
    Resolve { host: String, source: io::Error },
    #[error("failed to connect to {addr}: {source}")]
    Connect { addr: SocketAddr, source: io::Error },
    #[error("upstream send failed: {0}")]
    UpstreamSend(io::Error),
    #[error("client I/O failed: {0}")]
    Client(io::Error),
}

/// How a connection that got a response ended.
enum Outcome {
    /// Served from memory.
    Hit { bytes: usize },
    /// Streamed from the origin; `cached` reports whether the staging
    /// buffer was committed.
    Forwarded { bytes: usize, cached: bool },
}

/// Handles one accepted client connection end to end.
///
/// Cheap to clone; every connection gets its own copy while the cache
/// stays shared.
#[derive(Clone)]
pub struct Forwarder {
    cache: Arc<ResponseCache>,
    limits: RequestLimits,
    upstream: UpstreamConfig,
}

impl Forwarder {
    pub fn new(cache: Arc<ResponseCache>, config: &ProxyConfig) -> Self {
        Self {
            cache,
            limits: config.limits.clone(),
            upstream: config.upstream.clone(),
        }
    }

    /// Drive the connection to completion, logging the outcome. All
    /// errors are terminal for this connection only.
    pub async fn run(self, mut client: TcpStream, peer: SocketAddr) {
        let conn_id = Uuid::new_v4();
        match self.handle(&mut client).await {
            Ok(Outcome::Hit { bytes }) => {
                tracing::debug!(
                    conn_id = %conn_id,
                    peer_addr = %peer,
                    bytes,
                    "Served from cache"
                );
            }
            Ok(Outcome::Forwarded { bytes, cached }) => {
                tracing::debug!(
                    conn_id = %conn_id,
                    peer_addr = %peer,
                    bytes,
                    cached,
                    "Forwarded from origin"
                );
            }
            Err(error) => {
                metrics::record_forward_error(error.kind());
                tracing::debug!(
                    conn_id = %conn_id,
                    peer_addr = %peer,
                    error = %error,
                    "Connection closed without response"
                );
            }
        }
        // client and upstream sockets close on drop, the admission
        // permit is released by the caller's task scope
    }

    async fn handle(&self, client: &mut TcpStream) -> Result<Outcome, ForwardError> {
        let raw = self.read_request(client).await?;

        if let Some(blob) = self.cache.find(&raw) {
            client.write_all(&blob).await.map_err(ForwardError::Client)?;
            return Ok(Outcome::Hit { bytes: blob.len() });
        }

        let request = Request::parse(&raw)?;
        let host = request.header("Host").ok_or(ForwardError::MissingHost)?;
        let mut upstream = self.dial(host).await?;

        upstream
            .write_all(&raw)
            .await
            .map_err(ForwardError::UpstreamSend)?;

        Ok(self.stream_response(client, &mut upstream, raw).await)
    }

    /// READ_REQUEST: accumulate client bytes until the header terminator
    /// appears or the length cap is reached. Fragmented requests are
    /// reassembled; whatever was received verbatim becomes the cache key.
    async fn read_request(&self, client: &mut TcpStream) -> Result<Vec<u8>, ForwardError> {
        let mut raw = Vec::with_capacity(self.limits.recv_chunk_bytes);
        let mut chunk = vec![0u8; self.limits.recv_chunk_bytes];
        loop {
            let n = client.read(&mut chunk).await.map_err(ForwardError::Client)?;
            if n == 0 {
                return Err(if raw.is_empty() {
                    ForwardError::EmptyRequest
                } else {
                    ForwardError::TruncatedRequest
                });
            }
            // only the tail can complete a terminator split across reads
            let scan_from = raw.len().saturating_sub(3);
            raw.extend_from_slice(&chunk[..n]);
            if raw[scan_from..].windows(4).any(|w| w == b"\r\n\r\n") {
                if raw.len() < self.limits.min_request_bytes {
                    return Err(ForwardError::BadRequest(ParseError));
                }
                return Ok(raw);
            }
            if raw.len() >= self.limits.max_request_bytes {
                // over the window; the parser rejects it downstream
                return Ok(raw);
            }
        }
    }

    /// RESOLVE_UPSTREAM: Host header name, configured port.
    async fn dial(&self, host: &str) -> Result<TcpStream, ForwardError> {
        let addr = resolver::resolve(host, self.upstream.default_port)
            .await
            .map_err(|source| ForwardError::Resolve {
                host: host.to_string(),
                source,
            })?;

        let connect = TcpStream::connect(addr);
        let timeout = Duration::from_secs(self.upstream.connect_timeout_secs);
        match tokio::time::timeout(timeout, connect).await {
            Ok(Ok(stream)) => Ok(stream),
            Ok(Err(source)) => Err(ForwardError::Connect { addr, source }),
            Err(_) => Err(ForwardError::Connect {
                addr,
                source: io::Error::new(io::ErrorKind::TimedOut, "connect timed out"),
            }),
        }
    }

    /// STREAM_RESPONSE + COMMIT: relay origin bytes to the client while
    /// tee-ing them into a staging buffer, then hand the buffer to the
    /// cache. Socket errors here stop the stream but still commit what
    /// was captured.
    async fn stream_response(
        &self,
        client: &mut TcpStream,
        upstream: &mut TcpStream,
        raw_request: Vec<u8>,
    ) -> Outcome {
        let mut chunk = vec![0u8; self.limits.recv_chunk_bytes];
        let mut staging: Vec<u8> = Vec::new();
        let mut teeing = true;
        let mut forwarded = 0usize;

        loop {
            let n = match upstream.read(&mut chunk).await {
                Ok(0) => break,
                Ok(n) => n,
                Err(error) => {
                    tracing::debug!(error = %error, "Upstream read failed mid-stream");
                    break;
                }
            };

            if let Err(error) = client.write_all(&chunk[..n]).await {
                tracing::debug!(error = %error, "Client write failed mid-stream");
                break;
            }
            forwarded += n;

            if teeing {
                if staging.len() + n > self.cache.max_entry_bytes() {
                    // response outgrew the cacheable size; forward only
                    staging = Vec::new();
                    teeing = false;
                } else {
                    staging.extend_from_slice(&chunk[..n]);
                }
            }
        }

        let cached = !staging.is_empty() && self.cache.insert(&raw_request, staging);
        Outcome::Forwarded {
            bytes: forwarded,
            cached,
        }
    }
}

impl ForwardError {
    /// Stable label for metrics.
    fn kind(&self) -> &'static str {
        match self {
            ForwardError::EmptyRequest => "empty_request",
            ForwardError::TruncatedRequest => "truncated_request",
            ForwardError::BadRequest(_) => "bad_request",
            ForwardError::MissingHost => "missing_host",
            ForwardError::Resolve { .. } => "resolve",
            ForwardError::Connect { .. } => "connect",
            ForwardError::UpstreamSend(_) => "upstream_send",
            ForwardError::Client(_) => "client_io",
        }
    }
}
