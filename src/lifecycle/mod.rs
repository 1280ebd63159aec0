//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! startup.rs: Config → validate → logger + host wiring → Application
//!
//! Application::start
//!     → net::listener binds
//!     → serve task spawned, holding a Shutdown signal
//!     → RunningServer kept by the Application
//!
//! signals.rs (binary) / Application::close
//!     → Shutdown::trigger → graceful drain → serve task joined
//! ```

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{RunningServer, Shutdown};
pub use signals::{stop_signal, StopSignal};
pub use startup::{bootstrap, Bootstrap, BootstrapError};
