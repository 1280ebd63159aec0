//! Error-to-response translation.
//!
//! # Data Flow
//! ```text
//! handler returns Err(HandlerError) / panics / extractor rejects
//!     → HandlerError::into_response (placeholder body + ErrorReport extension)
//!     → translate_errors middleware finds the report
//!     → ErrorHandler::handle(error, request info, reply)
//!     → JSON error body sent to the client
//! ```

use std::any::Any;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        ConnectInfo, Request, State,
    },
    http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::observability::{format::tagged, Logger};

/// Error raised while handling a request.
///
/// Any `std::error::Error` converts into it, so handlers can use `?`. Axum
/// extractor rejections become validation errors.
#[derive(Debug, Clone)]
pub struct HandlerError {
    message: String,
    status: Option<StatusCode>,
    validation: Option<Value>,
    stack: String,
}

impl HandlerError {
    /// Error with a message and no explicit status.
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        let stack = with_backtrace(format!("Error: {}", message));
        Self {
            message,
            status: None,
            validation: None,
            stack,
        }
    }

    /// Error carrying an explicit status; its message is always shown to clients.
    pub fn with_status(status: StatusCode, message: impl Into<String>) -> Self {
        Self::new(message).status(status)
    }

    /// Validation failure with structured details.
    pub fn validation(details: Value) -> Self {
        Self {
            validation: Some(details),
            ..Self::new("Validation Error")
        }
    }

    /// Capture an error and its source chain.
    pub fn from_error<E>(error: &E) -> Self
    where
        E: std::error::Error + ?Sized,
    {
        let mut stack = format!("Error: {}", error);
        let mut source = error.source();
        while let Some(cause) = source {
            stack.push_str(&format!("\n    caused by: {}", cause));
            source = cause.source();
        }
        Self {
            message: error.to_string(),
            status: None,
            validation: None,
            stack: with_backtrace(stack),
        }
    }

    /// Set the explicit status.
    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn explicit_status(&self) -> Option<StatusCode> {
        self.status
    }

    pub fn validation_details(&self) -> Option<&Value> {
        self.validation.as_ref()
    }

    pub fn is_validation(&self) -> bool {
        self.validation.is_some()
    }

    /// Error text followed by its causes and, when enabled, a backtrace.
    pub fn stack(&self) -> &str {
        &self.stack
    }

    fn from_rejection(body_text: String, status: StatusCode) -> Self {
        Self::validation(json!([{ "message": body_text, "status": status.as_u16() }]))
    }
}

fn with_backtrace(mut stack: String) -> String {
    let backtrace = Backtrace::capture();
    if backtrace.status() == BacktraceStatus::Captured {
        stack.push('\n');
        stack.push_str(&backtrace.to_string());
    }
    stack
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl<E> From<E> for HandlerError
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        let any: &dyn Any = &error;
        if let Some(rejection) = any.downcast_ref::<JsonRejection>() {
            return Self::from_rejection(rejection.body_text(), rejection.status());
        }
        if let Some(rejection) = any.downcast_ref::<QueryRejection>() {
            return Self::from_rejection(rejection.body_text(), rejection.status());
        }
        if let Some(rejection) = any.downcast_ref::<PathRejection>() {
            return Self::from_rejection(rejection.body_text(), rejection.status());
        }
        Self::from_error(&error)
    }
}

/// Marker placed in response extensions so the translator can find the error.
#[derive(Debug, Clone)]
pub struct ErrorReport(pub Arc<HandlerError>);

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        // Fallback body for routers mounted without the translator.
        let mut response = render_default(&self, Reply::new(self.status), false);
        response.extensions_mut().insert(ErrorReport(Arc::new(self)));
        response
    }
}

/// What the error handler knows about the failed request.
#[derive(Debug, Clone)]
pub struct RequestInfo {
    pub method: Method,
    pub uri: Uri,
    pub remote_addr: Option<SocketAddr>,
}

impl RequestInfo {
    pub fn from_request(request: &Request) -> Self {
        Self {
            method: request.method().clone(),
            uri: request.uri().clone(),
            remote_addr: request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|info| info.0),
        }
    }
}

/// Response builder handed to error handlers.
#[derive(Debug, Default)]
pub struct Reply {
    status: Option<StatusCode>,
    headers: HeaderMap,
}

impl Reply {
    pub fn new(status: Option<StatusCode>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
        }
    }

    /// Status already chosen for this reply, if any.
    pub fn current_status(&self) -> Option<StatusCode> {
        self.status
    }

    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Send a structured body.
    pub fn json<T: Serialize>(self, body: &T) -> Response {
        let status = self.status.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = match serde_json::to_value(body) {
            Ok(value) => (status, Json(value)).into_response(),
            Err(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "httpCode": 500, "message": "Internal Server Error" })),
            )
                .into_response(),
        };
        response.headers_mut().extend(self.headers);
        response
    }

    /// Send a plain text body.
    pub fn text(self, body: impl Into<String>) -> Response {
        let status = self.status.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = (status, body.into()).into_response();
        response.headers_mut().extend(self.headers);
        response
    }
}

/// Override point for translating request errors into responses.
pub trait ErrorHandler: Send + Sync + 'static {
    fn handle(&self, error: &HandlerError, request: &RequestInfo, reply: Reply) -> Response;
}

impl<F> ErrorHandler for F
where
    F: Fn(&HandlerError, &RequestInfo, Reply) -> Response + Send + Sync + 'static,
{
    fn handle(&self, error: &HandlerError, request: &RequestInfo, reply: Reply) -> Response {
        self(error, request, reply)
    }
}

/// Shared error handler; `Debug` so it can live in `Config`.
#[derive(Clone)]
pub struct SharedErrorHandler(pub Arc<dyn ErrorHandler>);

impl SharedErrorHandler {
    pub fn new<H: ErrorHandler>(handler: H) -> Self {
        Self(Arc::new(handler))
    }
}

impl fmt::Debug for SharedErrorHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedErrorHandler(..)")
    }
}

/// Body sent by [`DefaultErrorHandler`].
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody<'a> {
    pub http_code: u16,
    pub message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_errors: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<&'a str>,
}

fn render_default(error: &HandlerError, reply: Reply, development: bool) -> Response {
    let status = reply.current_status().unwrap_or(if error.is_validation() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    });

    let message = if error.is_validation() {
        "Validation Error"
    } else if error.explicit_status().is_some() || development {
        error.message()
    } else {
        "Internal Server Error"
    };

    let body = ErrorBody {
        http_code: status.as_u16(),
        message,
        validation_errors: error.validation_details(),
        stack: (development && !error.is_validation()).then(|| error.stack()),
    };

    reply.status(status).json(&body)
}

/// Stock translation: JSON body, generic message outside development.
#[derive(Debug, Clone)]
pub struct DefaultErrorHandler {
    logger: Logger,
    development: bool,
    log_errors: bool,
}

impl DefaultErrorHandler {
    pub fn new(logger: Logger, development: bool, log_errors: bool) -> Self {
        Self {
            logger,
            development,
            log_errors,
        }
    }
}

impl ErrorHandler for DefaultErrorHandler {
    fn handle(&self, error: &HandlerError, request: &RequestInfo, reply: Reply) -> Response {
        let colors = self.logger.ansi();
        self.logger.error(tagged(
            &[
                "Error occurred while processing route",
                request.method.as_str(),
                &request.uri.to_string(),
            ],
            colors,
        ));
        if self.log_errors {
            self.logger.error(tagged(&[error.stack()], colors));
        }

        render_default(error, reply, self.development)
    }
}

/// Middleware state for [`translate_errors`].
#[derive(Clone)]
pub struct ErrorTranslation {
    handler: Arc<dyn ErrorHandler>,
}

impl ErrorTranslation {
    pub fn new(handler: Arc<dyn ErrorHandler>) -> Self {
        Self { handler }
    }
}

/// Replace responses produced from a [`HandlerError`] with the handler's translation.
pub async fn translate_errors(
    State(translation): State<ErrorTranslation>,
    request: Request,
    next: Next,
) -> Response {
    let info = RequestInfo::from_request(&request);
    let response = next.run(request).await;

    match response.extensions().get::<ErrorReport>().cloned() {
        Some(ErrorReport(error)) => {
            translation
                .handler
                .handle(&error, &info, Reply::new(error.explicit_status()))
        }
        None => response,
    }
}

/// Text carried by a panic payload, if it is a string.
pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> Option<String> {
    if let Some(s) = panic.downcast_ref::<String>() {
        Some(s.clone())
    } else {
        panic.downcast_ref::<&str>().map(|s| s.to_string())
    }
}

/// `CatchPanicLayer` callback: a panic becomes a [`HandlerError`].
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = panic_message(panic.as_ref()).unwrap_or_else(|| "handler panicked".to_string());
    HandlerError::new(message).into_response()
}
