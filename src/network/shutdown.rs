//! Shutdown signalling
//!
//! Out-of-band stop request, checked by the acceptor and by every worker at
//! the top of its loop.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::sync::BoundedQueue;

use super::connection::PendingConnection;
use super::receiving::ReceivingSet;

const WAKE_TIMEOUT: Duration = Duration::from_secs(1);

/// Cloneable handle that stops a running server
///
/// Triggering sets the stop flag and closes the connection queue, releasing
/// every thread blocked in it and dropping connections not yet dequeued.
/// Workers still waiting for a request frame see end-of-stream. Finally the
/// acceptor is woken out of `accept` with a loopback connection. Requests
/// already read run to completion.
#[derive(Clone)]
pub struct ShutdownHandle {
    stop: Arc<AtomicBool>,
    queue: Arc<BoundedQueue<PendingConnection>>,
    receiving: Arc<ReceivingSet>,
    wake_addr: SocketAddr,
}

impl ShutdownHandle {
    pub(crate) fn new(
        stop: Arc<AtomicBool>,
        queue: Arc<BoundedQueue<PendingConnection>>,
        receiving: Arc<ReceivingSet>,
        listen_addr: SocketAddr,
    ) -> Self {
        Self {
            stop,
            queue,
            receiving,
            wake_addr: loopback_for(listen_addr),
        }
    }

    /// Request shutdown; later calls are no-ops
    pub fn trigger(&self) {
        if self.stop.swap(true, Ordering::SeqCst) {
            return;
        }

        let dropped = self.queue.close();
        if !dropped.is_empty() {
            tracing::info!("Dropping {} queued connections", dropped.len());
        }

        let interrupted = self.receiving.close();
        if interrupted > 0 {
            tracing::info!("Interrupted {} connections still sending", interrupted);
        }

        // The acceptor notices the flag as soon as accept returns
        if let Err(e) = TcpStream::connect_timeout(&self.wake_addr, WAKE_TIMEOUT) {
            tracing::debug!("Wake-up connection to {} failed: {}", self.wake_addr, e);
        }
    }

    /// Whether shutdown was requested
    pub fn is_triggered(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }
}

/// A wildcard listen address is reached through the loopback interface
fn loopback_for(addr: SocketAddr) -> SocketAddr {
    match addr.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => {
            SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), addr.port())
        }
        IpAddr::V6(ip) if ip.is_unspecified() => {
            SocketAddr::new(IpAddr::V6(Ipv6Addr::LOCALHOST), addr.port())
        }
        _ => addr,
    }
}
