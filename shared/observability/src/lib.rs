//! CamHub observability library.
//!
//! Standardized tracing-subscriber setup with JSON or pretty formatting.
//! Library crates emit events only; binaries call `init_tracing` exactly
//! once at startup.

pub mod init;

pub use init::*;

// Re-export tracing for convenience
pub use tracing::{debug, error, info, instrument, span, trace, warn, Level};
