//! Application instance subsystem.
//!
//! # Data Flow
//! ```text
//! Bootstrap → Application (Configured)
//!     → inject_one / inject_many / set_ctx / plugin
//!     → start(): controllers → plugins → listen (Started)
//!     → close()
//! ```

pub mod context;
pub mod instance;

pub use context::{InjectError, Injected, SharedContext, BLACKLISTED_KEYS};
pub use instance::{Application, Phase, Plugin, StartError};
