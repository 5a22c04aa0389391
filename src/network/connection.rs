//! Connection Handler
//!
//! Serves the single request carried by an accepted connection.

use std::io::{BufReader, BufWriter, ErrorKind};
use std::net::{SocketAddr, TcpStream};
use std::time::{Duration, Instant};

use crate::engine::Engine;
use crate::error::{KvError, Result};
use crate::protocol::{parse_request, read_frame, write_frame, FieldLimits, Response};
use crate::store::Store;

use super::receiving::ReceivingSet;

/// An accepted connection waiting in the queue
#[derive(Debug)]
pub struct PendingConnection {
    stream: TcpStream,
    peer_addr: SocketAddr,
    arrived_at: Instant,
}

impl PendingConnection {
    /// Wrap a freshly accepted stream, stamping its arrival time
    pub fn new(stream: TcpStream, peer_addr: SocketAddr) -> Self {
        Self {
            stream,
            peer_addr,
            arrived_at: Instant::now(),
        }
    }

    /// When the acceptor took the connection
    pub fn arrived_at(&self) -> Instant {
        self.arrived_at
    }

    /// Address of the client
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Give up the queue entry for its stream
    pub fn into_stream(self) -> TcpStream {
        self.stream
    }
}

/// How a connection ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Request parsed and executed; carries the reply that was sent
    Served(Response),

    /// Request unreadable or malformed; `FORMAT ERROR` was sent
    Rejected,

    /// Peer went away before a reply was possible
    Dropped,
}

/// Handles a single client connection
pub struct Connection {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Peer address for logging
    peer_addr: SocketAddr,
}

impl Connection {
    /// Create a new connection handler
    pub fn new(stream: TcpStream, peer_addr: SocketAddr) -> Result<Self> {
        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;

        let read_stream = stream.try_clone()?;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(stream),
            peer_addr,
        })
    }

    /// Configure connection timeouts, 0 leaves the direction unbounded
    pub fn set_timeouts(&mut self, read_ms: u64, write_ms: u64) -> Result<()> {
        if read_ms > 0 {
            self.reader
                .get_ref()
                .set_read_timeout(Some(Duration::from_millis(read_ms)))?;
        }
        if write_ms > 0 {
            self.writer
                .get_ref()
                .set_write_timeout(Some(Duration::from_millis(write_ms)))?;
        }

        Ok(())
    }

    /// Receive, parse, execute and answer one request
    ///
    /// The stream stays in `receiving` until the frame is read, so a shutdown
    /// ends a read from a silent client instead of waiting on it.
    pub fn serve<S: Store>(
        &mut self,
        engine: &Engine<S>,
        receiving: &ReceivingSet,
        limits: FieldLimits,
        max_frame_size: usize,
    ) -> Outcome {
        let received = match receiving.register(self.reader.get_ref()) {
            Ok(_registered) => read_frame(&mut self.reader, max_frame_size),
            Err(e) => {
                tracing::warn!("Could not track connection from {}: {}", self.peer_addr, e);
                return Outcome::Dropped;
            }
        };

        let message = match received {
            Ok(Some(message)) if !message.is_empty() => message,
            Ok(Some(_)) => {
                tracing::debug!("Empty request from {}", self.peer_addr);
                return self.reject();
            }
            Ok(None) => {
                tracing::debug!("Client {} closed without sending a request", self.peer_addr);
                return Outcome::Dropped;
            }
            Err(KvError::Io(ref e)) if is_disconnect(e.kind()) => {
                tracing::debug!("Client {} disconnected: {}", self.peer_addr, e);
                return Outcome::Dropped;
            }
            Err(e) => {
                tracing::warn!("Error reading from {}: {}", self.peer_addr, e);
                return self.reject();
            }
        };

        let request = match parse_request(&message, limits) {
            Ok(request) => request,
            Err(e) => {
                tracing::debug!("Malformed request from {}: {}", self.peer_addr, e);
                return self.reject();
            }
        };

        tracing::trace!("Received {} {} from {}", request.operation(), request.key_lossy(), self.peer_addr);

        let response = engine.execute(&request);
        if let Err(e) = self.send_response(&response) {
            self.log_send_failure(&e);
        }

        Outcome::Served(response)
    }

    /// Answer `FORMAT ERROR`
    fn reject(&mut self) -> Outcome {
        if let Err(e) = self.send_response(&Response::FormatError) {
            self.log_send_failure(&e);
        }
        Outcome::Rejected
    }

    /// Send a response to the client
    fn send_response(&mut self, response: &Response) -> Result<()> {
        write_frame(&mut self.writer, &response.to_bytes())
    }

    fn log_send_failure(&self, e: &KvError) {
        match e {
            KvError::Io(io) if is_disconnect(io.kind()) => tracing::debug!(
                "Client {} disconnected before response could be sent: {}",
                self.peer_addr,
                e
            ),
            _ => tracing::warn!("Error writing to {}: {}", self.peer_addr, e),
        }
    }

    /// Get the peer address
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }
}

fn is_disconnect(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe
            | ErrorKind::NotConnected
    )
}
