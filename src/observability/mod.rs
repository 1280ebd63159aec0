//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! LoggerOptions
//!     → logging.rs (LoggerFactory builds a Logger with its own dispatcher)
//!     → Logger handed to bootstrap, controller loader, error handler,
//!       request logging hook
//!
//! Request/response dumps:
//!     → format.rs (status buckets, JSON pretty-printing, colors)
//! ```

pub mod format;
pub mod logging;

pub use logging::{LogFormat, Logger, LoggerFactory, LoggerOptions};
