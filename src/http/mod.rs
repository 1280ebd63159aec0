//! HTTP host subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → TraceLayer
//!     → CORS / security headers (when enabled)
//!     → request_log.rs (buffer bodies, log after send)
//!     → error.rs translate_errors (HandlerError → ErrorHandler)
//!     → CatchPanicLayer (panic → HandlerError)
//!     → controller routes mounted by server.rs
//! ```

pub mod error;
pub mod request_log;
pub mod server;

pub use error::{
    DefaultErrorHandler, ErrorBody, ErrorHandler, ErrorReport, HandlerError, Reply, RequestInfo,
    SharedErrorHandler,
};
pub use request_log::RequestLogHook;
pub use server::{Host, MountError};
