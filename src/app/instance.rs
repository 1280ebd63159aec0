//! Application lifecycle.
//!
//! # Responsibilities
//! - Own the host until `start()` moves it into the running server
//! - Hold the shared context, injected dependencies and plugins
//! - Register controllers, run plugins in order, then bind (listeners start last)
//! - Refuse a second start and injections after start

use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use serde_json::Value;
use thiserror::Error;

use crate::app::context::{InjectError, Injected, SharedContext};
use crate::config::Config;
use crate::controllers::{ControllerError, ControllerLoader, ModuleLoader};
use crate::http::Host;
use crate::lifecycle::RunningServer;
use crate::net::ListenerError;
use crate::observability::{format::tagged, Logger};
use crate::BoxError;

/// Async hook run once per `start()`, after controllers are registered.
pub type Plugin =
    Box<dyn for<'a> Fn(&'a mut Application) -> BoxFuture<'a, Result<(), BoxError>> + Send + Sync>;

/// Lifecycle phase. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Configured,
    Starting,
    Started,
}

/// Why `start()` failed.
#[derive(Debug, Error)]
pub enum StartError {
    #[error("application already started")]
    AlreadyStarted,

    #[error("controller registration failed: {0}")]
    Controllers(#[from] ControllerError),

    #[error("plugin failed: {0}")]
    Plugin(#[source] BoxError),

    #[error("failed to bind listener: {0}")]
    Bind(#[from] ListenerError),
}

/// One configured web application.
pub struct Application {
    host: Option<Host>,
    config: Arc<Config>,
    logger: Logger,
    modules: Arc<dyn ModuleLoader>,
    context: SharedContext,
    injected: Injected,
    plugins: Vec<Plugin>,
    phase: Phase,
    server: Option<RunningServer>,
}

impl Application {
    pub(crate) fn new(
        host: Host,
        config: Arc<Config>,
        logger: Logger,
        modules: Arc<dyn ModuleLoader>,
    ) -> Self {
        let context = SharedContext::seeded(&config.controller_context);
        Self {
            host: Some(host),
            config,
            logger,
            modules,
            context,
            injected: Injected::default(),
            plugins: Vec::new(),
            phase: Phase::Configured,
            server: None,
        }
    }

    /// Register controllers, run plugins and bind the listener.
    ///
    /// Returns the bound address as `http://host:port`.
    pub async fn start(&mut self) -> Result<String, StartError> {
        if self.phase != Phase::Configured {
            return Err(StartError::AlreadyStarted);
        }
        self.phase = Phase::Starting;

        let host = self.host.as_mut().ok_or(StartError::AlreadyStarted)?;
        ControllerLoader::new(self.modules.as_ref(), &self.logger)
            .register(
                host,
                &self.config.controllers,
                &self.config.global_prefix,
                &self.context,
                &self.injected,
            )
            .await?;

        self.run_plugins().await?;

        let mut host = self.host.take().ok_or(StartError::AlreadyStarted)?;
        host.extension(self.context.clone())
            .extension(self.injected.clone());

        let server = host.listen(&self.config.host, self.config.port).await?;
        let address = format!("http://{}", server.local_addr());
        self.logger.info(tagged(
            &["Server listening on", &address],
            self.logger.ansi(),
        ));

        self.server = Some(server);
        self.phase = Phase::Started;
        Ok(address)
    }

    async fn run_plugins(&mut self) -> Result<(), StartError> {
        let plugins = std::mem::take(&mut self.plugins);

        let mut outcome = Ok(());
        for plugin in &plugins {
            if let Err(e) = plugin(self).await {
                outcome = Err(StartError::Plugin(e));
                break;
            }
        }

        // Plugins registered while running are kept after the original list.
        let added = std::mem::replace(&mut self.plugins, plugins);
        self.plugins.extend(added);
        outcome
    }

    /// Inject one dependency.
    pub fn inject_one(&mut self, key: impl Into<String>, value: Value) -> Result<&mut Self, InjectError> {
        self.inject_many([(key.into(), value)])
    }

    /// Inject several dependencies; nothing is applied if any entry is refused.
    pub fn inject_many<K, I>(&mut self, entries: I) -> Result<&mut Self, InjectError>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        if self.has_started() {
            return Err(InjectError::AlreadyStarted);
        }
        let entries = entries
            .into_iter()
            .map(|(key, value)| (key.into(), value))
            .collect();
        self.injected.insert_all(entries)?;
        Ok(self)
    }

    /// Injected dependency by key.
    pub fn injected(&self, key: &str) -> Option<Value> {
        self.injected.get(key)
    }

    /// Handle to the injected map, as controllers see it.
    pub fn injections(&self) -> &Injected {
        &self.injected
    }

    /// Shared context entry.
    pub fn ctx(&self, key: &str) -> Option<Value> {
        self.context.get(key)
    }

    /// Write a shared context entry. Allowed in every phase.
    pub fn set_ctx(&mut self, key: impl Into<String>, value: Value) -> &mut Self {
        self.context.set(key, value);
        self
    }

    /// Handle to the shared context, as controllers see it.
    pub fn context(&self) -> &SharedContext {
        &self.context
    }

    /// Queue a plugin. Plugins run in registration order during `start()`,
    /// after controllers are mounted and before the listener binds. Each
    /// one is awaited before the next, and an error aborts the start.
    pub fn plugin<F>(&mut self, plugin: F) -> &mut Self
    where
        F: for<'a> Fn(&'a mut Application) -> BoxFuture<'a, Result<(), BoxError>>
            + Send
            + Sync
            + 'static,
    {
        self.plugins.push(Box::new(plugin));
        self
    }

    /// Number of queued plugins.
    pub fn plugin_count(&self) -> usize {
        self.plugins.len()
    }

    /// Configured port (the bound one may differ when it is `0`).
    pub fn port(&self) -> u16 {
        self.config.port
    }

    /// Interface the listener binds to.
    pub fn bind_host(&self) -> &str {
        &self.config.host
    }

    /// Validated configuration the application was built from.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Framework logger; the same one handed to middleware.
    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Raw host, until `start()` hands it to the server.
    pub fn host(&self) -> Option<&Host> {
        self.host.as_ref()
    }

    /// Mutable host for plugins that add routes or layers.
    pub fn host_mut(&mut self) -> Option<&mut Host> {
        self.host.as_mut()
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// `true` once the listener is bound and serving.
    pub fn has_started(&self) -> bool {
        self.phase == Phase::Started
    }

    /// Bound address of the running server.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.as_ref().map(RunningServer::local_addr)
    }

    /// Stop the server and wait for in-flight requests.
    pub async fn close(&mut self) -> io::Result<()> {
        match self.server.take() {
            Some(server) => {
                server.shutdown().await?;
                self.logger
                    .info(tagged(&["Server closed"], self.logger.ansi()));
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl fmt::Debug for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Application")
            .field("phase", &self.phase)
            .field("host", &self.config.host)
            .field("port", &self.config.port)
            .field("plugins", &self.plugins.len())
            .field("local_addr", &self.local_addr())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::RegistryLoader;
    use crate::observability::{LoggerFactory, LoggerOptions};
    use serde_json::json;

    fn app(config: Config) -> Application {
        let logger = LoggerFactory::create_with_writer(&LoggerOptions::default(), std::io::sink);
        Application::new(
            Host::new(),
            Arc::new(config),
            logger,
            Arc::new(RegistryLoader::new()),
        )
    }

    fn ephemeral() -> Config {
        Config {
            port: 0,
            ..Config::default()
        }
    }

    #[test]
    fn test_inject_and_read_back() {
        let mut app = app(Config::default());
        app.inject_one("db", json!("postgres://")).unwrap();
        app.inject_many([("a", json!(1)), ("b", json!(2))]).unwrap();

        assert_eq!(app.injected("db"), Some(json!("postgres://")));
        assert_eq!(app.injected("b"), Some(json!(2)));
        assert_eq!(app.injections().len(), 3);
    }

    #[test]
    fn test_inject_refusals() {
        let mut app = app(Config::default());
        assert_eq!(
            app.inject_one("prefix", json!("/x")).unwrap_err(),
            InjectError::Blacklisted("prefix".into())
        );
        assert_eq!(
            app.inject_one("hallo", Value::Null).unwrap_err(),
            InjectError::MissingValue("hallo".into())
        );
    }

    #[test]
    fn test_context_seeded_from_config() {
        let mut app = app(Config::default().context("hello", json!("world")));
        assert_eq!(app.ctx("hello"), Some(json!("world")));

        app.set_ctx("yo", json!("whats up"));
        assert_eq!(app.ctx("yo"), Some(json!("whats up")));
    }

    #[tokio::test]
    async fn test_start_once() {
        let mut app = app(ephemeral());
        assert_eq!(app.phase(), Phase::Configured);

        let address = app.start().await.unwrap();
        assert!(address.starts_with("http://127.0.0.1:"));
        assert!(app.has_started());
        assert!(app.host().is_none());

        assert!(matches!(app.start().await, Err(StartError::AlreadyStarted)));
        assert_eq!(
            app.inject_one("late", json!(1)).unwrap_err(),
            InjectError::AlreadyStarted
        );

        app.set_ctx("after", json!(true));
        assert_eq!(app.ctx("after"), Some(json!(true)));

        app.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_plugins_run_in_order() {
        let mut app = app(ephemeral());
        app.plugin(|app| {
            Box::pin(async move {
                app.set_ctx("order", json!(["first"]));
                Ok::<(), BoxError>(())
            })
        });
        app.plugin(|app| {
            Box::pin(async move {
                let mut order = app.ctx("order").unwrap_or_else(|| json!([]));
                if let Some(list) = order.as_array_mut() {
                    list.push(json!("second"));
                }
                app.set_ctx("order", order);
                Ok::<(), BoxError>(())
            })
        });

        app.start().await.unwrap();
        assert_eq!(app.ctx("order"), Some(json!(["first", "second"])));
        assert_eq!(app.plugin_count(), 2);
        app.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_plugin_failure_propagates() {
        let mut app = app(ephemeral());
        app.plugin(|_| Box::pin(async { Err::<(), BoxError>("plugin exploded".into()) }));

        let err = app.start().await.unwrap_err();
        assert!(matches!(err, StartError::Plugin(_)));
        assert_eq!(err.to_string(), "plugin failed: plugin exploded");
        assert_eq!(app.phase(), Phase::Starting);
        assert!(app.local_addr().is_none());
    }
}
