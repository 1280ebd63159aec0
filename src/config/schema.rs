//! Configuration schema definitions.
//!
//! Everything except `controllers` literals and `error_handler` can be read
//! from a TOML file; those two are only reachable through the Rust API.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::controllers::ControllerSource;
use crate::http::error::{ErrorHandler, SharedErrorHandler};
use crate::observability::LoggerOptions;
use crate::security::{CorsSetting, HelmetSetting};

/// Same as axum's `DefaultBodyLimit`.
pub const DEFAULT_MAX_LOGGED_BODY: usize = 2 * 1024 * 1024;

/// Root configuration of an application.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Glob patterns and literal controller definitions, in registration order.
    /// In files: a single pattern string or an array of them.
    #[serde(deserialize_with = "controller_patterns")]
    pub controllers: Vec<ControllerSource>,

    /// Initial entries of the shared context.
    pub controller_context: Map<String, Value>,

    /// Prefix prepended to every controller prefix.
    pub global_prefix: String,

    /// CORS: `false`, `true` or an options table.
    pub cors: CorsSetting,

    /// Security headers: `false`, `true` or an options table.
    pub helmet: HelmetSetting,

    /// Replaces the stock JSON error translation.
    #[serde(skip)]
    pub error_handler: Option<SharedErrorHandler>,

    /// Expose error messages and stacks in responses.
    pub development: bool,

    /// Listen port; `0` picks an ephemeral port.
    pub port: u16,

    /// Listen host.
    pub host: String,

    /// Logger settings.
    pub logger: LoggerOptions,

    /// Log every request/response exchange.
    pub log_requests: bool,

    /// Largest body, in bytes, the request log buffers and dumps. Larger or
    /// unsized bodies stream through and are logged as a size marker.
    pub max_logged_body: usize,

    /// Log the stack of errors reaching the default error handler.
    pub log_errors: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            controllers: Vec::new(),
            controller_context: Map::new(),
            global_prefix: "/".to_string(),
            cors: CorsSetting::default(),
            helmet: HelmetSetting::default(),
            error_handler: None,
            development: false,
            port: 3000,
            host: "127.0.0.1".to_string(),
            logger: LoggerOptions::default(),
            log_requests: false,
            max_logged_body: DEFAULT_MAX_LOGGED_BODY,
            log_errors: true,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a controller source.
    pub fn controller(mut self, source: impl Into<ControllerSource>) -> Self {
        self.controllers.push(source.into());
        self
    }

    /// Seed one shared context entry.
    pub fn context(mut self, key: impl Into<String>, value: Value) -> Self {
        self.controller_context.insert(key.into(), value);
        self
    }

    pub fn error_handler<H: ErrorHandler>(mut self, handler: H) -> Self {
        self.error_handler = Some(SharedErrorHandler::new(handler));
        self
    }

    /// Glob patterns among the controller sources.
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.controllers.iter().filter_map(|source| match source {
            ControllerSource::Pattern(pattern) => Some(pattern.as_str()),
            ControllerSource::Definition(_) => None,
        })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn controller_patterns<'de, D>(deserializer: D) -> Result<Vec<ControllerSource>, D::Error>
where
    D: Deserializer<'de>,
{
    let patterns = match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(pattern) => vec![pattern],
        OneOrMany::Many(patterns) => patterns,
    };
    Ok(patterns.into_iter().map(ControllerSource::Pattern).collect())
}
