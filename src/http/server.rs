//! HTTP host setup.
//!
//! # Responsibilities
//! - Collect controller routers under their prefixes
//! - Wire up middleware (panic capture, error translation, request logging,
//!   security headers, CORS, tracing)
//! - Bind the listener and serve with graceful shutdown

use std::net::SocketAddr;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use axum::{
    http::{HeaderName, HeaderValue},
    middleware,
    routing::MethodRouter,
    Extension, Router,
};
use thiserror::Error;
use tower_http::{
    catch_panic::CatchPanicLayer, cors::CorsLayer, set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::http::error::{
    panic_message, panic_response, translate_errors, DefaultErrorHandler, ErrorHandler, ErrorTranslation,
};
use crate::http::request_log::{log_exchange, RequestLogHook};
use crate::lifecycle::{RunningServer, Shutdown};
use crate::net::{bind, ListenerError};
use crate::observability::Logger;

/// A router axum refused to mount, usually because its routes overlap
/// ones already registered.
#[derive(Debug, Error)]
#[error("cannot mount routes at `{prefix}`: {message}")]
pub struct MountError {
    pub prefix: String,
    pub message: String,
}

/// The web host controllers are registered on.
pub struct Host {
    router: Router,
    error_handler: Arc<dyn ErrorHandler>,
    cors: Option<CorsLayer>,
    security_headers: Vec<(HeaderName, HeaderValue)>,
    request_log: Option<RequestLogHook>,
}

impl std::fmt::Debug for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Host").finish_non_exhaustive()
    }
}

impl Host {
    /// Empty host with the production error handler.
    pub fn new() -> Self {
        Self::from_router(Router::new())
    }

    /// Start from routes built elsewhere.
    pub fn from_router(router: Router) -> Self {
        Self {
            router,
            error_handler: Arc::new(DefaultErrorHandler::new(Logger::current(), false, true)),
            cors: None,
            security_headers: Vec::new(),
            request_log: None,
        }
    }

    /// Add a route at an absolute path.
    pub fn route(&mut self, path: &str, method_router: MethodRouter) -> &mut Self {
        self.router = std::mem::take(&mut self.router).route(path, method_router);
        self
    }

    pub fn merge(&mut self, router: Router) -> &mut Self {
        self.router = std::mem::take(&mut self.router).merge(router);
        self
    }

    /// Register `router` under `prefix`; the root prefix merges.
    ///
    /// axum panics on overlapping routes and invalid nest paths. That panic
    /// is caught and returned as a [`MountError`], and the host keeps the
    /// routes it had before the call.
    pub fn mount(&mut self, prefix: &str, router: Router) -> Result<&mut Self, MountError> {
        let current = self.router.clone();
        let mounted = panic::catch_unwind(AssertUnwindSafe(move || {
            if prefix == "/" || prefix.is_empty() {
                current.merge(router)
            } else {
                current.nest(prefix, router)
            }
        }));

        match mounted {
            Ok(router) => {
                self.router = router;
                Ok(self)
            }
            Err(panic) => Err(MountError {
                prefix: prefix.to_string(),
                message: panic_message(panic.as_ref())
                    .unwrap_or_else(|| "router rejected the routes".to_string()),
            }),
        }
    }

    /// Add a request extension to every route registered so far.
    pub fn extension<T>(&mut self, value: T) -> &mut Self
    where
        T: Clone + Send + Sync + 'static,
    {
        self.router = std::mem::take(&mut self.router).layer(Extension(value));
        self
    }

    /// Replace the handler that turns [`HandlerError`](crate::http::HandlerError)s into responses.
    pub fn set_error_handler(&mut self, handler: Arc<dyn ErrorHandler>) -> &mut Self {
        self.error_handler = handler;
        self
    }

    pub fn enable_cors(&mut self, layer: CorsLayer) -> &mut Self {
        self.cors = Some(layer);
        self
    }

    /// Add headers to every response that does not already carry them.
    pub fn enable_security_headers(&mut self, headers: Vec<(HeaderName, HeaderValue)>) -> &mut Self {
        self.security_headers = headers;
        self
    }

    /// Log every exchange through `logger`. Bodies up to `max_body` bytes
    /// are buffered and dumped; larger ones stream through unlogged.
    pub fn enable_request_logging(&mut self, logger: Logger, max_body: usize) -> &mut Self {
        self.request_log = Some(RequestLogHook::new(logger, max_body));
        self
    }

    pub fn has_request_logging(&self) -> bool {
        self.request_log.is_some()
    }

    pub fn has_cors(&self) -> bool {
        self.cors.is_some()
    }

    /// Final router with the middleware stack applied.
    pub fn into_router(self) -> Router {
        let translation = ErrorTranslation::new(self.error_handler);

        let mut router = self
            .router
            .layer(CatchPanicLayer::custom(panic_response))
            .layer(middleware::from_fn_with_state(translation, translate_errors));

        if let Some(hook) = self.request_log {
            router = router.layer(middleware::from_fn_with_state(hook, log_exchange));
        }
        for (name, value) in self.security_headers {
            router = router.layer(SetResponseHeaderLayer::if_not_present(name, value));
        }
        if let Some(cors) = self.cors {
            router = router.layer(cors);
        }

        router.layer(TraceLayer::new_for_http())
    }

    /// Bind `host:port` and serve on a background task.
    pub async fn listen(self, host: &str, port: u16) -> Result<RunningServer, ListenerError> {
        let (listener, addr) = bind(host, port).await?;

        let shutdown = Shutdown::new();
        let signal = shutdown.signal();
        let app = self
            .into_router()
            .into_make_service_with_connect_info::<SocketAddr>();

        let handle = tokio::spawn(async move {
            tracing::info!(address = %addr, "HTTP server starting");
            axum::serve(listener, app)
                .with_graceful_shutdown(signal)
                .await?;
            tracing::info!(address = %addr, "HTTP server stopped");
            Ok::<_, std::io::Error>(())
        });

        Ok(RunningServer::new(addr, shutdown, handle))
    }
}

impl Default for Host {
    fn default() -> Self {
        Self::new()
    }
}
