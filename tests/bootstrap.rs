//! Middleware wiring done by bootstrap: CORS, security headers, error
//! translation and request logging.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    routing::{get, post},
    Json,
};
use serde_json::{json, Value};
use trellis::http::{HandlerError, Reply, RequestInfo};
use trellis::security::{CorsSetting, HelmetSetting};
use trellis::{Application, Bootstrap, BoxError, Config, ControllerExport, ControllerOptions, Scope};

mod common;

async fn secret_failure() -> Result<String, HandlerError> {
    Err(HandlerError::new("secret database detail"))
}

async fn missing_user() -> Result<String, HandlerError> {
    Err(HandlerError::with_status(StatusCode::NOT_FOUND, "user 42 not found"))
}

async fn create(payload: Result<Json<Value>, JsonRejection>) -> Result<Json<Value>, HandlerError> {
    let Json(body) = payload?;
    Ok(Json(json!({ "created": body })))
}

async fn explode() -> &'static str {
    panic!("handler blew up")
}

fn api(scope: &mut Scope, _: &ControllerOptions) -> Result<(), BoxError> {
    scope
        .route("/hello", get(|| async { "hello" }))
        .route("/secret", get(secret_failure))
        .route("/missing", get(missing_user))
        .route("/create", post(create))
        .route("/panic", get(explode))
        .route("/upload", post(|| async { "ignored" }));
    Ok(())
}

async fn started(config: Config) -> (Application, String) {
    let mut app = Bootstrap::new(config.controller(ControllerExport::new(api)))
        .logger(common::quiet_logger())
        .build()
        .unwrap();
    let address = app.start().await.unwrap();
    (app, address)
}

fn on(port: u16) -> Config {
    Config {
        port,
        ..Config::default()
    }
}

#[tokio::test]
async fn test_cors_preflight() {
    let (mut app, address) = started(Config {
        cors: CorsSetting::Enabled(true),
        ..on(28421)
    })
    .await;

    let response = common::client()
        .request(reqwest::Method::OPTIONS, format!("{}/hello", address))
        .header("Origin", "http://example.com")
        .header("Access-Control-Request-Method", "POST")
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
    let methods = response.headers()["access-control-allow-methods"]
        .to_str()
        .unwrap()
        .to_string();
    assert!(methods.contains("POST"));

    app.close().await.unwrap();
}

#[tokio::test]
async fn test_security_headers() {
    let (mut app, address) = started(Config {
        helmet: HelmetSetting::Enabled(true),
        ..on(28422)
    })
    .await;

    let response = common::client()
        .get(format!("{}/hello", address))
        .send()
        .await
        .unwrap();
    let headers = response.headers();
    assert_eq!(headers["x-frame-options"], "SAMEORIGIN");
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["referrer-policy"], "no-referrer");
    assert!(headers.contains_key("content-security-policy"));

    app.close().await.unwrap();
}

#[tokio::test]
async fn test_production_error_bodies() {
    let (mut app, address) = started(on(28423)).await;
    let client = common::client();

    let response = client.get(format!("{}/secret", address)).send().await.unwrap();
    assert_eq!(response.status(), 500);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "httpCode": 500, "message": "Internal Server Error" }));

    let response = client.get(format!("{}/missing", address)).send().await.unwrap();
    assert_eq!(response.status(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "httpCode": 404, "message": "user 42 not found" }));

    let response = client
        .post(format!("{}/create", address))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Validation Error");
    assert!(body["validationErrors"].is_array());

    let response = client.get(format!("{}/panic", address)).send().await.unwrap();
    assert_eq!(response.status(), 500);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Internal Server Error");

    app.close().await.unwrap();
}

#[tokio::test]
async fn test_development_error_bodies() {
    let (mut app, address) = started(Config {
        development: true,
        ..on(28424)
    })
    .await;

    let response = common::client()
        .get(format!("{}/secret", address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 500);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["httpCode"], 500);
    assert_eq!(body["message"], "secret database detail");
    assert!(body["stack"]
        .as_str()
        .unwrap()
        .starts_with("Error: secret database detail"));

    app.close().await.unwrap();
}

#[tokio::test]
async fn test_custom_error_handler() {
    let config = on(28425).error_handler(|error: &HandlerError, request: &RequestInfo, reply: Reply| {
        reply
            .status(StatusCode::IM_A_TEAPOT)
            .json(&json!({ "custom": error.message(), "path": request.uri.path() }))
    });
    let (mut app, address) = started(config).await;

    let response = common::client()
        .get(format!("{}/secret", address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 418);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "custom": "secret database detail", "path": "/secret" }));

    app.close().await.unwrap();
}

#[tokio::test]
async fn test_request_logging() {
    let (logger, capture) = common::capture_logger();
    let config = Config {
        log_requests: true,
        ..on(28426)
    }
    .controller(ControllerExport::new(api));
    let mut app = Bootstrap::new(config).logger(logger).build().unwrap();
    let address = app.start().await.unwrap();

    let response = common::client()
        .post(format!("{}/create", address))
        .json(&json!({ "name": "widget" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "created": { "name": "widget" } }));

    let logs = capture.contents();
    assert!(logs.contains("200 POST /create (127.0.0.1)"));
    assert!(logs.contains("Request:\n{\n  \"name\": \"widget\"\n}"));
    assert!(logs.contains("Response:\n{\n  \"created\": {\n    \"name\": \"widget\"\n  }\n}"));

    app.close().await.unwrap();
}

#[tokio::test]
async fn test_request_logging_off_by_default() {
    let (logger, capture) = common::capture_logger();
    let config = on(28427).controller(ControllerExport::new(api));
    let mut app = Bootstrap::new(config).logger(logger).build().unwrap();
    let address = app.start().await.unwrap();

    common::client()
        .get(format!("{}/hello", address))
        .send()
        .await
        .unwrap();
    assert!(!capture.contents().contains("GET /hello"));

    app.close().await.unwrap();
}

#[tokio::test]
async fn test_request_logging_skips_large_bodies() {
    let (logger, capture) = common::capture_logger();
    let config = Config {
        log_requests: true,
        max_logged_body: 1024,
        ..on(28428)
    }
    .controller(ControllerExport::new(api));
    let mut app = Bootstrap::new(config).logger(logger).build().unwrap();
    let address = app.start().await.unwrap();

    let response = common::client()
        .post(format!("{}/upload", address))
        .body(vec![b'x'; 8 * 1024])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "ignored");

    let logs = capture.contents();
    assert!(logs.contains("200 POST /upload (127.0.0.1)"));
    assert!(logs.contains("Request: <8192 bytes>"));
    assert!(logs.contains("Response:\nignored"));
    assert!(!logs.contains("xxxxxxxx"));

    app.close().await.unwrap();
}
