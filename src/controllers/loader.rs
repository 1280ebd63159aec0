//! Controller discovery and registration.
//!
//! # Responsibilities
//! - Expand glob patterns into module paths (glob order, not re-sorted)
//! - Resolve paths through a [`ModuleLoader`], keep literal definitions in place
//! - Skip records without a handler and paths no module is registered for,
//!   with a warning
//! - Report a panicking handler or overlapping routes as a registration error
//! - Mount every valid controller on the host under its effective prefix

use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;

use crate::app::context::{Injected, SharedContext};
use crate::controllers::module::{module_name, ModuleLoader};
use crate::controllers::prefix::join_prefix;
use crate::controllers::{
    ControllerError, ControllerExport, ControllerModule, ControllerOptions, ControllerSource, Scope,
};
use crate::http::{error::panic_message, Host};
use crate::observability::{format::tagged, Logger};
use crate::BoxError;

/// A controller ready for registration.
#[derive(Debug, Clone)]
pub struct ResolvedController {
    /// File stem for discovered modules, display name for literal definitions.
    pub name: String,
    pub export: ControllerExport,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredController {
    pub name: String,
    pub prefix: String,
}

/// Outcome of [`ControllerLoader::register`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationReport {
    pub registered: Vec<RegisteredController>,
    pub skipped: Vec<String>,
}

enum Pending<'s> {
    Literal(&'s ControllerModule),
    File(PathBuf),
}

/// Loads controllers from sources and registers them on a [`Host`].
pub struct ControllerLoader<'a> {
    modules: &'a dyn ModuleLoader,
    logger: &'a Logger,
}

impl<'a> ControllerLoader<'a> {
    pub fn new(modules: &'a dyn ModuleLoader, logger: &'a Logger) -> Self {
        Self { modules, logger }
    }

    fn line(&self, message: &str) -> String {
        tagged(&["[controllers]", message], self.logger.ansi())
    }

    /// Expand one glob pattern.
    pub fn expand(&self, pattern: &str) -> Result<Vec<PathBuf>, ControllerError> {
        self.logger
            .info(self.line(&format!("Looking up path {}", pattern)));

        let entries = glob::glob(pattern).map_err(|source| ControllerError::Pattern {
            pattern: pattern.to_string(),
            source,
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            match entry {
                Ok(path) => paths.push(path),
                Err(e) => self.logger.warn(self.line(&format!(
                    "Skipping unreadable path {}: {}",
                    e.path().display(),
                    e.error()
                ))),
            }
        }
        Ok(paths)
    }

    /// Flatten sources into normalized controllers, preserving order.
    pub async fn resolve(
        &self,
        sources: &[ControllerSource],
    ) -> Result<Vec<ResolvedController>, ControllerError> {
        let mut pending = Vec::new();
        for source in sources {
            match source {
                ControllerSource::Definition(module) => pending.push(Pending::Literal(module)),
                ControllerSource::Pattern(pattern) => {
                    pending.extend(self.expand(pattern)?.into_iter().map(Pending::File))
                }
            }
        }

        let mut resolved = Vec::with_capacity(pending.len());
        for item in pending {
            let controller = match item {
                Pending::Literal(module) => {
                    let export = module.clone().normalize();
                    ResolvedController {
                        name: export.display_name().to_string(),
                        export,
                    }
                }
                Pending::File(path) => {
                    let name = module_name(&path)
                        .map(str::to_string)
                        .unwrap_or_else(|| path.display().to_string());
                    let export = match self.modules.load(&path).await {
                        Ok(module) => module.normalize(),
                        // Matches like `mod.rs` are routine; register() skips the empty record.
                        Err(ControllerError::ModuleNotFound { path }) => {
                            self.logger.warn(self.line(&format!(
                                "No controller module registered for {}",
                                path.display()
                            )));
                            ControllerExport::empty()
                        }
                        Err(e) => return Err(e),
                    };
                    ResolvedController { name, export }
                }
            };
            resolved.push(controller);
        }

        Ok(resolved)
    }

    /// Resolve `sources` and mount each valid controller on `host`.
    pub async fn register(
        &self,
        host: &mut Host,
        sources: &[ControllerSource],
        global_prefix: &str,
        ctx: &SharedContext,
        injected: &Injected,
    ) -> Result<RegistrationReport, ControllerError> {
        let controllers = self.resolve(sources).await?;
        let mut report = RegistrationReport::default();

        for controller in controllers {
            let Some(handler) = controller.export.handler.as_ref() else {
                self.logger.warn(self.line(&format!(
                    "Controller {} does not have a handler. Skipping...",
                    controller.name
                )));
                report.skipped.push(controller.name);
                continue;
            };

            let route_prefix = controller.export.route_prefix.as_deref();
            let prefix = join_prefix(global_prefix, route_prefix.unwrap_or(""));
            let options = ControllerOptions {
                prefix: prefix.clone(),
                ctx: ctx.clone(),
                injected: injected.clone(),
            };

            let mut scope = Scope::new();
            let built = panic::catch_unwind(AssertUnwindSafe(|| handler.call(&mut scope, &options)))
                .unwrap_or_else(|panic| {
                    let message = panic_message(panic.as_ref())
                        .unwrap_or_else(|| "controller handler panicked".to_string());
                    Err(BoxError::from(message))
                })
                .and_then(|()| {
                    host.mount(&prefix, scope.into_router())
                        .map(|_| ())
                        .map_err(BoxError::from)
                });
            if let Err(source) = built {
                return Err(ControllerError::Registration {
                    name: controller.name,
                    source,
                });
            }

            let message = match route_prefix {
                Some(_) => format!("{} ({}) registered", controller.name, prefix),
                None => format!("{} registered", controller.name),
            };
            self.logger.info(self.line(&message));

            report.registered.push(RegisteredController {
                name: controller.name,
                prefix,
            });
        }

        Ok(report)
    }
}
