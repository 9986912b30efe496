//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Parse CLI → Load config → Validate → Bind listener → Run
//!
//! Shutdown (shutdown.rs):
//!     SIGINT/SIGTERM → broadcast → accept loop stops → process exits
//! ```

pub mod shutdown;

pub use shutdown::Shutdown;
