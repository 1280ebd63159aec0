//! Request/response logging middleware.
//!
//! Runs outside the error translator, so the status and body it sees are the
//! ones sent to the client.

use std::net::SocketAddr;

use axum::{
    body::{to_bytes, Body, Bytes, HttpBody},
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::observability::{
    format::{format_json, format_status_code, JsonFormat},
    Logger,
};

/// What the log shows for one body.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Captured {
    Empty,
    Buffered(Bytes),
    /// Over the limit or of unknown length; the known size, if any.
    Streamed(Option<u64>),
}

impl Captured {
    fn marker(size: Option<u64>) -> String {
        match size {
            Some(n) => format!("<{} bytes>", n),
            None => "<streamed body>".to_string(),
        }
    }
}

/// State for [`log_exchange`].
#[derive(Debug, Clone)]
pub struct RequestLogHook {
    logger: Logger,
    max_body: usize,
}

impl RequestLogHook {
    /// Hook logging through `logger`; bodies over `max_body` bytes are not buffered.
    pub fn new(logger: Logger, max_body: usize) -> Self {
        Self { logger, max_body }
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn max_body(&self) -> usize {
        self.max_body
    }

    /// Buffer `body` when its exact length is known and within the limit,
    /// and hand back a body carrying the same bytes.
    async fn capture(&self, body: Body, side: &str) -> (Body, Captured) {
        let hint = HttpBody::size_hint(&body);
        match hint.exact() {
            Some(0) => (body, Captured::Empty),
            Some(n) if n <= self.max_body as u64 => match to_bytes(body, self.max_body).await {
                Ok(bytes) => (Body::from(bytes.clone()), Captured::Buffered(bytes)),
                Err(e) => {
                    self.logger
                        .warn(format!("Failed to read {} body: {}", side, e));
                    (Body::empty(), Captured::Empty)
                }
            },
            size => (body, Captured::Streamed(size)),
        }
    }

    fn payload(&self, bytes: &Bytes) -> String {
        let text = String::from_utf8_lossy(bytes);
        format_json(
            &text,
            JsonFormat {
                colors: self.logger.ansi(),
                minify: false,
            },
        )
    }

    fn dump(&self, label: &str, captured: &Captured) {
        match captured {
            Captured::Empty => {}
            Captured::Buffered(bytes) => self
                .logger
                .info(format!("{}:\n{}", label, self.payload(bytes))),
            Captured::Streamed(size) => self
                .logger
                .info(format!("{}: {}", label, Captured::marker(*size))),
        }
    }

    fn summary(&self, status: u16, method: &str, path: &str, remote: Option<SocketAddr>) -> String {
        let status = if self.logger.ansi() {
            format_status_code(status).to_string()
        } else {
            status.to_string()
        };
        let remote = remote.map_or_else(|| "-".to_string(), |addr| addr.ip().to_string());
        format!("{} {} {} ({})", status, method, path, remote)
    }
}

fn is_event_stream(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("text/event-stream"))
}

/// Log every completed exchange.
///
/// Bodies within the hook's limit are buffered and re-attached. Larger
/// bodies, bodies of unknown length and event streams pass through untouched.
pub async fn log_exchange(
    State(hook): State<RequestLogHook>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request
        .uri()
        .path_and_query()
        .map_or_else(|| request.uri().path().to_string(), |pq| pq.to_string());
    let remote = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0);

    let (parts, body) = request.into_parts();
    let (body, request_body) = hook.capture(body, "request").await;
    let request = Request::from_parts(parts, body);

    let response = next.run(request).await;
    let status = response.status().as_u16();

    let (response, response_body) = if is_event_stream(response.headers()) {
        (response, Captured::Empty)
    } else {
        let (parts, body) = response.into_parts();
        let (body, captured) = hook.capture(body, "response").await;
        (Response::from_parts(parts, body), captured)
    };

    hook.logger
        .info(hook.summary(status, method.as_str(), &path, remote));
    hook.dump("Request", &request_body);
    hook.dump("Response", &response_body);

    response
}
