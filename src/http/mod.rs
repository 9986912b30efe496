//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (accept loop, task per connection)
//!     → forwarder.rs (cache lookup, upstream dial, streaming)
//!     → request.rs (absolute-URI parse, Host extraction)
//!     → Response bytes back to client, verbatim
//! ```

pub mod forwarder;
pub mod request;
pub mod server;

pub use forwarder::Forwarder;
pub use request::{Header, ParseError, Request};
pub use server::ProxyServer;
