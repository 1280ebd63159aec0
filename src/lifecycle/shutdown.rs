//! Shutdown coordination for a running server.

use std::io;
use std::net::SocketAddr;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Broadcast trigger observed by the serve task.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Future resolving once [`Shutdown::trigger`] fires (or every trigger is dropped).
    pub fn signal(&self) -> impl std::future::Future<Output = ()> + Send + 'static {
        let mut rx = self.tx.subscribe();
        async move {
            let _ = rx.recv().await;
        }
    }

    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Number of tasks still waiting on the signal.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// A spawned axum server.
#[derive(Debug)]
pub struct RunningServer {
    addr: SocketAddr,
    shutdown: Shutdown,
    handle: JoinHandle<io::Result<()>>,
}

impl RunningServer {
    pub(crate) fn new(addr: SocketAddr, shutdown: Shutdown, handle: JoinHandle<io::Result<()>>) -> Self {
        Self {
            addr,
            shutdown,
            handle,
        }
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stop accepting, drain in-flight requests and wait for the serve task.
    pub async fn shutdown(self) -> io::Result<()> {
        self.shutdown.trigger();
        match self.handle.await {
            Ok(result) => result,
            Err(join_error) => Err(io::Error::other(join_error)),
        }
    }
}
