//! Logger construction.
//!
//! # Responsibilities
//! - Build a structured logger from declarative [`LoggerOptions`]
//! - Hand the logger to components explicitly instead of a process-wide singleton
//! - Optionally install the logger as the global `tracing` default (binaries)
//!
//! A [`Logger`] owns its own `tracing::Dispatch`, so two applications in one
//! process (or one test binary) log through independent subscribers.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::dispatcher::{self, Dispatch, SetGlobalDefaultError};
use tracing_subscriber::{
    fmt::{self as fmt_layer, MakeWriter},
    layer::SubscriberExt,
    EnvFilter, Layer, Registry,
};

/// Output format of the fmt layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line, human oriented.
    Pretty,
    /// One line per event.
    #[default]
    Compact,
    /// Newline-delimited JSON.
    Json,
}

/// Declarative logger settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggerOptions {
    /// `EnvFilter` directives (e.g. `"info"`, `"trellis=debug,tower_http=warn"`).
    /// `RUST_LOG` takes precedence when set.
    pub level: String,

    /// Output format.
    pub format: LogFormat,

    /// Emit ANSI colors. Also controls colorization of request/response dumps.
    pub ansi: bool,

    /// Include the event target in each line.
    pub targets: bool,
}

impl Default for LoggerOptions {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
            ansi: true,
            targets: false,
        }
    }
}

struct LoggerInner {
    dispatch: Dispatch,
    ansi: bool,
}

/// Handle to a structured logger.
///
/// Cheap to clone; clones log through the same subscriber.
#[derive(Clone)]
pub struct Logger {
    inner: Arc<LoggerInner>,
}

impl Logger {
    /// Wrap an existing dispatcher.
    pub fn from_dispatch(dispatch: Dispatch, ansi: bool) -> Self {
        Self {
            inner: Arc::new(LoggerInner { dispatch, ansi }),
        }
    }

    /// Logger that forwards to whatever subscriber is currently the default.
    pub fn current() -> Self {
        let dispatch = dispatcher::get_default(|d| d.clone());
        Self::from_dispatch(dispatch, true)
    }

    /// Whether formatted messages should carry ANSI colors.
    pub fn ansi(&self) -> bool {
        self.inner.ansi
    }

    /// The underlying dispatcher.
    pub fn dispatch(&self) -> &Dispatch {
        &self.inner.dispatch
    }

    /// Install this logger's subscriber as the process-wide default.
    pub fn install_global(&self) -> Result<(), SetGlobalDefaultError> {
        dispatcher::set_global_default(self.inner.dispatch.clone())
    }

    pub fn debug(&self, message: impl AsRef<str>) {
        let message = message.as_ref();
        dispatcher::with_default(&self.inner.dispatch, || {
            tracing::debug!(target: "trellis", "{}", message)
        });
    }

    pub fn info(&self, message: impl AsRef<str>) {
        let message = message.as_ref();
        dispatcher::with_default(&self.inner.dispatch, || {
            tracing::info!(target: "trellis", "{}", message)
        });
    }

    pub fn warn(&self, message: impl AsRef<str>) {
        let message = message.as_ref();
        dispatcher::with_default(&self.inner.dispatch, || {
            tracing::warn!(target: "trellis", "{}", message)
        });
    }

    pub fn error(&self, message: impl AsRef<str>) {
        let message = message.as_ref();
        dispatcher::with_default(&self.inner.dispatch, || {
            tracing::error!(target: "trellis", "{}", message)
        });
    }

    /// True when both handles share one subscriber.
    pub fn same_as(&self, other: &Logger) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for Logger {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("ansi", &self.inner.ansi)
            .finish_non_exhaustive()
    }
}

/// Builds [`Logger`]s.
pub struct LoggerFactory;

impl LoggerFactory {
    /// Create a logger writing to stdout.
    pub fn create(options: &LoggerOptions) -> Logger {
        Self::create_with_writer(options, std::io::stdout)
    }

    /// Create a logger writing to an arbitrary sink.
    pub fn create_with_writer<W>(options: &LoggerOptions, writer: W) -> Logger
    where
        W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&options.level));

        let layer: Box<dyn Layer<Registry> + Send + Sync> = match options.format {
            LogFormat::Pretty => fmt_layer::layer()
                .pretty()
                .with_ansi(options.ansi)
                .with_target(options.targets)
                .with_writer(writer)
                .boxed(),
            LogFormat::Compact => fmt_layer::layer()
                .compact()
                .with_ansi(options.ansi)
                .with_target(options.targets)
                .with_writer(writer)
                .boxed(),
            LogFormat::Json => fmt_layer::layer()
                .json()
                .with_ansi(false)
                .with_target(options.targets)
                .with_writer(writer)
                .boxed(),
        };

        let subscriber = tracing_subscriber::registry().with(layer).with(filter);

        // JSON lines never carry escape codes.
        let ansi = options.ansi && options.format != LogFormat::Json;
        Logger::from_dispatch(Dispatch::new(subscriber), ansi)
    }
}
