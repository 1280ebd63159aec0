//! Controller auto-registration, request logging and error translation for axum.

pub mod app;
pub mod config;
pub mod controllers;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod security;

/// Error type at user-callback seams (controller handlers, plugins, loaders).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub use app::{Application, InjectError, Phase, StartError};
pub use config::Config;
pub use controllers::{ControllerExport, ControllerModule, ControllerOptions, RegistryLoader, Scope};
pub use http::{HandlerError, Host};
pub use lifecycle::{bootstrap, Bootstrap, BootstrapError};
pub use observability::{Logger, LoggerFactory};
