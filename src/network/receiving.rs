//! Receiving Registry
//!
//! Tracks the connections whose request is still being read, so a stop
//! request can cut those reads short.

use std::collections::HashMap;
use std::net::{Shutdown, TcpStream};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::error::Result;

#[derive(Default)]
struct Inner {
    streams: HashMap<u64, TcpStream>,
    closed: bool,
}

/// Connections currently waiting for their request frame
///
/// A worker registers the stream before reading and deregisters (by dropping
/// the guard) once the frame is in. Closing shuts down the read half of every
/// registered stream, so a blocked read returns end-of-stream. Streams
/// registered after closing are shut down on registration.
#[derive(Default)]
pub struct ReceivingSet {
    next_id: AtomicU64,
    inner: Mutex<Inner>,
}

impl ReceivingSet {
    /// Create an empty, open registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `stream` until the returned guard is dropped
    pub fn register(&self, stream: &TcpStream) -> Result<ReceivingGuard<'_>> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let handle = stream.try_clone()?;

        let mut inner = self.inner.lock();
        if inner.closed {
            shutdown_read(&handle);
        } else {
            inner.streams.insert(id, handle);
        }

        Ok(ReceivingGuard { set: self, id })
    }

    /// Shut down the read half of every registered stream and refuse new ones
    ///
    /// Returns the number of reads that were interrupted.
    pub fn close(&self) -> usize {
        let mut inner = self.inner.lock();
        inner.closed = true;

        let count = inner.streams.len();
        for (_, stream) in inner.streams.drain() {
            shutdown_read(&stream);
        }
        count
    }

    /// Number of streams currently registered
    pub fn len(&self) -> usize {
        self.inner.lock().streams.len()
    }

    /// Whether no stream is registered
    pub fn is_empty(&self) -> bool {
        self.inner.lock().streams.is_empty()
    }

    fn deregister(&self, id: u64) {
        self.inner.lock().streams.remove(&id);
    }
}

fn shutdown_read(stream: &TcpStream) {
    if let Err(e) = stream.shutdown(Shutdown::Read) {
        tracing::debug!("Could not shut down read half: {}", e);
    }
}

/// Registration released on drop
#[must_use = "the stream is deregistered as soon as the guard is dropped"]
pub struct ReceivingGuard<'a> {
    set: &'a ReceivingSet,
    id: u64,
}

impl Drop for ReceivingGuard<'_> {
    fn drop(&mut self) {
        self.set.deregister(self.id);
    }
}
