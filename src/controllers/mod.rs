//! Controller subsystem.
//!
//! # Data Flow
//! ```text
//! Config.controllers: [pattern | definition, ...]
//!     → loader.rs (glob expansion, in order)
//!     → module.rs (path → ControllerModule via ModuleLoader)
//!     → definition.rs (Wrapped → Direct normalization)
//!     → prefix.rs (global prefix + route prefix)
//!     → http::Host::mount
//! ```

pub mod definition;
pub mod loader;
pub mod module;
pub mod prefix;

use std::path::PathBuf;

use thiserror::Error;

use crate::BoxError;

pub use definition::{
    wrap, ControllerExport, ControllerModule, ControllerOptions, ControllerSource, Handler, Scope,
};
pub use loader::{ControllerLoader, RegisteredController, RegistrationReport, ResolvedController};
pub use module::{ModuleLoader, RegistryLoader};
pub use prefix::join_prefix;

/// Failures while discovering or registering controllers.
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("invalid controller pattern `{pattern}`: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    /// Returned by a [`ModuleLoader`] for paths it does not know. The
    /// controller loader logs and skips these.
    #[error("no controller module registered for `{}`", path.display())]
    ModuleNotFound { path: PathBuf },

    /// A [`ModuleLoader`] found the module but could not produce it.
    #[error("failed to load controller module `{}`: {source}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    /// The handler returned an error or panicked, or its routes could not be mounted.
    #[error("controller `{name}` failed to register: {source}")]
    Registration {
        name: String,
        #[source]
        source: BoxError,
    },
}
