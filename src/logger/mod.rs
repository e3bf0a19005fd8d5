//! The `logger` module installs a `tracing` subscriber whose filter starts from
//! `RUST_LOG` (or `info`) and is swapped for the configured one once settings
//! are loaded. Records go to stderr; stdout is left to command output.
//! See `bin/user_service_demo.rs` for a binary exercising it.

mod logger;
pub use logger::*;

pub use tracing::{debug, error, info, trace, warn};
