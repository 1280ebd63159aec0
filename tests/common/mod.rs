//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use trellis::observability::{LoggerOptions, LogFormat};
use trellis::{Logger, LoggerFactory};

/// In-memory log sink.
#[derive(Clone, Default)]
pub struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn plain_options() -> LoggerOptions {
    LoggerOptions {
        level: "debug".into(),
        format: LogFormat::Compact,
        ansi: false,
        targets: false,
    }
}

/// Logger whose output is discarded.
pub fn quiet_logger() -> Logger {
    LoggerFactory::create_with_writer(&plain_options(), std::io::sink)
}

/// Logger writing uncolored lines into the returned capture.
pub fn capture_logger() -> (Logger, Capture) {
    let capture = Capture::default();
    let sink = capture.clone();
    let logger = LoggerFactory::create_with_writer(&plain_options(), move || sink.clone());
    (logger, capture)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .no_proxy()
        .build()
        .unwrap()
}
