//! Controller definitions.

use std::fmt;
use std::sync::Arc;

use axum::{routing::MethodRouter, Router};

use crate::app::context::{Injected, SharedContext};
use crate::BoxError;

/// Routes contributed by one controller, relative to its prefix.
#[derive(Debug, Default)]
pub struct Scope {
    router: Router,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(&mut self, path: &str, method_router: MethodRouter) -> &mut Self {
        self.router = std::mem::take(&mut self.router).route(path, method_router);
        self
    }

    pub fn nest(&mut self, path: &str, router: Router) -> &mut Self {
        self.router = std::mem::take(&mut self.router).nest(path, router);
        self
    }

    pub fn merge(&mut self, router: Router) -> &mut Self {
        self.router = std::mem::take(&mut self.router).merge(router);
        self
    }

    pub fn into_router(self) -> Router {
        self.router
    }
}

/// What a controller receives next to its [`Scope`].
#[derive(Debug, Clone)]
pub struct ControllerOptions {
    /// Effective prefix the scope is mounted under.
    pub prefix: String,
    /// Shared context accessor.
    pub ctx: SharedContext,
    /// Injected dependencies.
    pub injected: Injected,
}

type HandlerFn = dyn Fn(&mut Scope, &ControllerOptions) -> Result<(), BoxError> + Send + Sync;

/// Registration callback of a controller.
#[derive(Clone)]
pub struct Handler(Arc<HandlerFn>);

impl Handler {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut Scope, &ControllerOptions) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn call(&self, scope: &mut Scope, options: &ControllerOptions) -> Result<(), BoxError> {
        (self.0)(scope, options)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Handler(..)")
    }
}

/// Normalized controller record.
///
/// A record without a handler is kept so the loader can report and skip it.
#[derive(Debug, Clone, Default)]
pub struct ControllerExport {
    pub handler: Option<Handler>,
    pub route_prefix: Option<String>,
    pub name: Option<String>,
}

impl ControllerExport {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&mut Scope, &ControllerOptions) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        Self {
            handler: Some(Handler::new(handler)),
            ..Self::default()
        }
    }

    /// Export without a handler.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.route_prefix = Some(prefix.into());
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Name used in log lines.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("(anonymous controller)")
    }
}

/// A controller module as produced by a loader.
#[derive(Debug, Clone)]
pub enum ControllerModule {
    /// The module's export is the controller itself.
    Direct(ControllerExport),
    /// Legacy wrapper around the real export; unwrapped one level on load.
    Wrapped {
        inner: Box<ControllerExport>,
        route_prefix: Option<String>,
    },
}

impl ControllerModule {
    /// Resolve to the record that gets registered.
    pub fn normalize(self) -> ControllerExport {
        match self {
            ControllerModule::Direct(export) => export,
            ControllerModule::Wrapped {
                inner,
                route_prefix,
            } => {
                let mut export = *inner;
                if route_prefix.is_some() {
                    export.route_prefix = route_prefix;
                }
                export
            }
        }
    }
}

impl From<ControllerExport> for ControllerModule {
    fn from(export: ControllerExport) -> Self {
        ControllerModule::Direct(export)
    }
}

/// Wrap an export in the legacy wrapper shape.
pub fn wrap(export: ControllerExport, route_prefix: Option<&str>) -> ControllerModule {
    ControllerModule::Wrapped {
        inner: Box::new(export),
        route_prefix: route_prefix.map(str::to_string),
    }
}

/// One entry of `Config::controllers`.
#[derive(Debug, Clone)]
pub enum ControllerSource {
    /// Glob pattern expanded against the filesystem.
    Pattern(String),
    /// Literal definition.
    Definition(ControllerModule),
}

impl From<&str> for ControllerSource {
    fn from(pattern: &str) -> Self {
        ControllerSource::Pattern(pattern.to_string())
    }
}

impl From<String> for ControllerSource {
    fn from(pattern: String) -> Self {
        ControllerSource::Pattern(pattern)
    }
}

impl From<ControllerModule> for ControllerSource {
    fn from(module: ControllerModule) -> Self {
        ControllerSource::Definition(module)
    }
}

impl From<ControllerExport> for ControllerSource {
    fn from(export: ControllerExport) -> Self {
        ControllerSource::Definition(ControllerModule::Direct(export))
    }
}
