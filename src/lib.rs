//! Forwarding HTTP Proxy Library
//!
//! A forwarding proxy for absolute-URI `GET` requests with an in-process
//! LRU response cache.
//!
//! # Data Flow
//! ```text
//! Client connection
//!     → net/listener.rs (accept loop, connection limits)
//!     → http/forwarder.rs (read request, consult cache)
//!         → cache hit:  write cached response, done
//!         → cache miss: http/request.rs (parse, pick upstream host)
//!                       → net/resolver.rs (host → address)
//!                       → stream origin response to client,
//!                         tee into staging buffer
//!                       → cache/ (commit staging on success)
//! ```

pub mod cache;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;

pub use cache::ResponseCache;
pub use config::schema::ProxyConfig;
pub use http::ProxyServer;
pub use lifecycle::Shutdown;
