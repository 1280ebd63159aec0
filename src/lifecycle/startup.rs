//! Startup orchestration.
//!
//! # Responsibilities
//! - Validate configuration
//! - Build the logger and the error handler
//! - Wire CORS, security headers and request logging onto the host
//! - Produce exactly one [`Application`]
//!
//! # Design Decisions
//! - Fail fast: an invalid config never produces an application
//! - Controllers and the listener are left to `Application::start`

use std::sync::Arc;

use thiserror::Error;

use crate::app::Application;
use crate::config::{validate_config, Config, ValidationError};
use crate::controllers::{ModuleLoader, RegistryLoader};
use crate::http::{DefaultErrorHandler, ErrorHandler, Host};
use crate::observability::{Logger, LoggerFactory};
use crate::security::{cors_layer, SecurityError};

/// Why an application could not be built.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("invalid configuration: {}", join(.0))]
    Config(Vec<ValidationError>),

    #[error(transparent)]
    Security(#[from] SecurityError),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Builder for an [`Application`].
pub struct Bootstrap {
    config: Config,
    host: Option<Host>,
    modules: Option<Arc<dyn ModuleLoader>>,
    logger: Option<Logger>,
}

impl Bootstrap {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            host: None,
            modules: None,
            logger: None,
        }
    }

    /// Use a pre-built host instead of an empty one.
    pub fn host(mut self, host: Host) -> Self {
        self.host = Some(host);
        self
    }

    /// Resolve discovered controller files through `loader`.
    pub fn loader<L: ModuleLoader + 'static>(mut self, loader: L) -> Self {
        self.modules = Some(Arc::new(loader));
        self
    }

    /// Log through `logger` instead of one built from `config.logger`.
    pub fn logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn build(self) -> Result<Application, BootstrapError> {
        let config = self.config;
        validate_config(&config).map_err(BootstrapError::Config)?;

        let logger = self
            .logger
            .unwrap_or_else(|| LoggerFactory::create(&config.logger));
        let mut host = self.host.unwrap_or_default();

        let error_handler: Arc<dyn ErrorHandler> = match &config.error_handler {
            Some(custom) => custom.0.clone(),
            None => Arc::new(DefaultErrorHandler::new(
                logger.clone(),
                config.development,
                config.log_errors,
            )),
        };
        host.set_error_handler(error_handler);

        if let Some(options) = config.cors.options() {
            host.enable_cors(cors_layer(&options)?);
        }
        if let Some(headers) = config.helmet.options() {
            host.enable_security_headers(headers.to_header_pairs()?);
        }
        if config.log_requests {
            host.enable_request_logging(logger.clone(), config.max_logged_body);
        }

        let modules = self
            .modules
            .unwrap_or_else(|| Arc::new(RegistryLoader::new()));

        logger.debug(format!(
            "application configured for {}:{} with {} controller source(s)",
            config.host,
            config.port,
            config.controllers.len()
        ));

        Ok(Application::new(host, Arc::new(config), logger, modules))
    }
}

/// Build an application with the stock host, loader and logger.
pub fn bootstrap(config: Config) -> Result<Application, BootstrapError> {
    Bootstrap::new(config).build()
}
