//! TCP listener binding.
//!
//! # Responsibilities
//! - Resolve the configured host/port pair
//! - Bind and report the actual local address (port 0 picks a free port)

use std::net::SocketAddr;

use tokio::net::TcpListener;

/// Error type for listener operations.
#[derive(Debug)]
pub enum ListenerError {
    /// Failed to bind to address.
    Bind {
        host: String,
        port: u16,
        source: std::io::Error,
    },
    /// Bound, but the local address could not be read.
    LocalAddr(std::io::Error),
}

impl std::fmt::Display for ListenerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListenerError::Bind { host, port, source } => {
                write!(f, "Failed to bind {}:{}: {}", host, port, source)
            }
            ListenerError::LocalAddr(e) => write!(f, "Failed to read local address: {}", e),
        }
    }
}

impl std::error::Error for ListenerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ListenerError::Bind { source, .. } => Some(source),
            ListenerError::LocalAddr(e) => Some(e),
        }
    }
}

/// Bind a listener on `host:port`.
pub async fn bind(host: &str, port: u16) -> Result<(TcpListener, SocketAddr), ListenerError> {
    let listener = TcpListener::bind((host, port))
        .await
        .map_err(|source| ListenerError::Bind {
            host: host.to_string(),
            port,
            source,
        })?;

    let local_addr = listener.local_addr().map_err(ListenerError::LocalAddr)?;

    tracing::debug!(address = %local_addr, "Listener bound");

    Ok((listener, local_addr))
}
